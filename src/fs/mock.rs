// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem for tests.
///
/// Paths are normalized (`./a/b` and `a/b` are the same entry) and parent
/// directories are created implicitly. `"."` is always present.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir);
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        let mut entries = self.lock();
        ensure_parents(&mut entries, &path);
        entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut entries = self.lock();
        ensure_parents(&mut entries, &path);
        entries.insert(path, MockEntry::Dir);
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock()
            .iter()
            .filter(|(_, entry)| matches!(entry, MockEntry::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    if parent.as_os_str().is_empty() {
        if path == Path::new(".") {
            None
        } else {
            Some(PathBuf::from("."))
        }
    } else {
        Some(parent.to_path_buf())
    }
}

fn ensure_parents(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = parent_of(path);
    while let Some(dir) = current {
        if matches!(entries.get(&dir), Some(MockEntry::Dir)) {
            break;
        }
        entries.insert(dir.clone(), MockEntry::Dir);
        current = parent_of(&dir);
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let entries = self.lock();
        match entries.get(&normalize(path)) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(&normalize(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(&normalize(path)), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(&normalize(path)), Some(MockEntry::Dir))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let dir = normalize(path);
        let entries = self.lock();
        if !matches!(entries.get(&dir), Some(MockEntry::Dir)) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }

        Ok(entries
            .keys()
            .filter(|candidate| *candidate != &dir && parent_of(candidate).as_ref() == Some(&dir))
            .filter_map(|candidate| candidate.file_name())
            .map(|name| path.join(name))
            .collect())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<bool> {
        let dir = normalize(path);
        let mut entries = self.lock();
        match entries.get(&dir) {
            None => Ok(false),
            Some(MockEntry::File(_)) => Err(anyhow!("Not a directory: {:?}", path)),
            Some(MockEntry::Dir) => {
                entries.retain(|candidate, _| !candidate.starts_with(&dir));
                if dir == Path::new(".") {
                    entries.insert(dir, MockEntry::Dir);
                }
                Ok(true)
            }
        }
    }
}
