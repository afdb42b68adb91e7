// src/paths/resolver.rs

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::paths::pattern_set::PatternSet;

/// Files matched by a pattern set, relative to `root`, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSet {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl ResolvedSet {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths, in lexicographic order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Absolute paths, in the same order as [`ResolvedSet::files`].
    pub fn absolute(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.files.iter().map(|rel| self.root.join(rel))
    }
}

/// Expand `patterns` under `root`.
///
/// The result is the union of all inclusion matches minus every exclusion
/// match, sorted so downstream stages see a reproducible order. Matching
/// nothing is not an error.
pub fn resolve(fs: &dyn FileSystem, root: &Path, patterns: &PatternSet) -> Result<ResolvedSet> {
    let matcher = patterns.compile()?;

    if !fs.is_dir(root) {
        return Err(PipelineError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source root {root:?} is not a directory"),
        )));
    }

    let mut matched: Vec<(String, PathBuf)> = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel_str) = relative_str(root, &path) {
                    if matcher.matches(&rel_str) {
                        matched.push((rel_str, path));
                    }
                }
            }
        }
    }

    matched.sort_by(|a, b| a.0.cmp(&b.0));
    matched.dedup_by(|a, b| a.0 == b.0);

    let files: Vec<PathBuf> = matched.into_iter().map(|(rel, _)| PathBuf::from(rel)).collect();
    debug!(set = %patterns.name(), root = ?root, count = files.len(), "resolved pattern set");

    Ok(ResolvedSet {
        root: root.to_path_buf(),
        files,
    })
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
