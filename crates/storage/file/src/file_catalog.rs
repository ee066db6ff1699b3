//! A file catalog mapping file IDs to their file names.

use page::FileId;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Catalog holding the mappings between a `FileId` and its corresponding path.
#[derive(Debug, Default)]
pub struct FileCatalog {
    mappings: RwLock<HashMap<FileId, PathBuf>>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self {
            mappings: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves `file_id` to a file path, if registered.
    pub(crate) fn get_file_name(&self, file_id: FileId) -> Option<PathBuf> {
        let guard = self
            .mappings
            .read()
            .expect("FileCatalog poisoned: another thread panicked while holding the lock");
        guard.get(&file_id).cloned()
    }

    /// Registers a new `file_id -> path` mapping.
    pub fn add_file(&self, file_id: FileId, path: PathBuf) {
        let mut guard = self
            .mappings
            .write()
            .expect("FileCatalog poisoned: another thread panicked while holding the lock");
        guard.insert(file_id, path);
    }
}
