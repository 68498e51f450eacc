use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use strata_core::serialize;

use super::Storage;
use crate::error::StateError;

/// File-backed storage using a single snapshot file, written atomically via
/// a temp-file rename on commit.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, StateError> {
        let path = path.into();
        let data = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| StateError::Storage(e.to_string()))?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                serialize::from_bytes(&bytes)
                    .map_err(|e| StateError::Serialization(e.to_string()))?
            }
        } else {
            BTreeMap::new()
        };

        Ok(FileStorage {
            path,
            data,
            pending: BTreeMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush_to_disk(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::Storage(e.to_string()))?;
        }

        let bytes =
            serialize::to_bytes(&self.data).map_err(|e| StateError::Serialization(e.to_string()))?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| StateError::Storage(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(pending) => pending.clone(),
            None => self.data.get(key).cloned(),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }

    fn commit(&mut self) -> Result<(), StateError> {
        for (key, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(v) => {
                    self.data.insert(key, v);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
        self.flush_to_disk()
    }

    fn rollback(&mut self) {
        self.pending.clear();
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let mut keys: std::collections::BTreeSet<Vec<u8>> = self
            .data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for (key, value) in &self.pending {
            if !key.starts_with(prefix) {
                continue;
            }
            match value {
                Some(_) => {
                    keys.insert(key.clone());
                }
                None => {
                    keys.remove(key);
                }
            }
        }
        keys.into_iter().collect()
    }
}
