#![allow(dead_code)]

pub use assetpipe_test_utils::builders;
pub use assetpipe_test_utils::fake_executor;
pub use assetpipe_test_utils::{init_tracing, with_timeout};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use assetpipe::config::ConfigFile;
use assetpipe::fs::RealFileSystem;
use assetpipe::tasks::{TaskContext, TaskRegistry};

/// Write `(relative path, contents)` pairs under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

/// Registry and context rooted at `project`, using the real filesystem.
pub fn real_project(project: &Path, cfg: &ConfigFile) -> (Arc<TaskRegistry>, Arc<TaskContext>) {
    let ctx = Arc::new(TaskContext::new(
        Arc::new(RealFileSystem),
        project,
        cfg.paths(),
    ));
    let registry = TaskRegistry::from_config(cfg, &ctx.source_dir).unwrap();
    (registry, ctx)
}
