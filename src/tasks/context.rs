// src/tasks/context.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::model::PathConfig;
use crate::fs::FileSystem;

/// Everything a task needs to touch the project: the filesystem and the two
/// roots, already joined onto the project directory.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub fs: Arc<dyn FileSystem>,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TaskContext {
    pub fn new(fs: Arc<dyn FileSystem>, project_root: &Path, paths: &PathConfig) -> Self {
        Self {
            fs,
            source_dir: project_root.join(&paths.source_root),
            output_dir: project_root.join(&paths.output_root),
        }
    }
}
