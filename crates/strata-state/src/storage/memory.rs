use std::collections::{BTreeMap, BTreeSet};

use super::Storage;
use crate::error::StateError;

/// In-memory storage backend over a BTreeMap
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    /// Committed data
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Pending writes; `None` marks a pending deletion
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Number of committed keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Storage for MemoryStorage {
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
        Ok(())
    }

    fn rollback(&mut self) {
        self.pending.clear();
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let mut keys: BTreeSet<Vec<u8>> = self
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_commit_get() {
        let mut storage = MemoryStorage::new();

        storage.put(b"k1", b"v1");
        storage.commit().unwrap();

        assert_eq!(storage.get(b"k1"), Some(b"v1".to_vec()));
        assert_eq!(storage.get(b"k2"), None);
    }

    #[test]
    fn test_rollback_drops_pending() {
        let mut storage = MemoryStorage::new();

        storage.put(b"k1", b"v1");
        // Pending writes are visible before commit
        assert_eq!(storage.get(b"k1"), Some(b"v1".to_vec()));

        storage.rollback();
        assert_eq!(storage.get(b"k1"), None);
    }

    #[test]
    fn test_pending_delete_shadows_committed() {
        let mut storage = MemoryStorage::new();

        storage.put(b"k1", b"v1");
        storage.commit().unwrap();

        storage.delete(b"k1");
        assert_eq!(storage.get(b"k1"), None);

        storage.rollback();
        assert_eq!(storage.get(b"k1"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_keys_with_prefix_merges_pending() {
        let mut storage = MemoryStorage::new();

        storage.put(b"acc:1", b"a");
        storage.put(b"acc:2", b"b");
        storage.put(b"kv:1", b"c");
        storage.commit().unwrap();

        storage.delete(b"acc:2");
        storage.put(b"acc:3", b"d");

        let keys = storage.keys_with_prefix(b"acc:");
        assert_eq!(keys, vec![b"acc:1".to_vec(), b"acc:3".to_vec()]);
    }
}
