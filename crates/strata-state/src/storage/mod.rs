pub mod file;
pub mod memory;

use crate::error::StateError;

/// Storage trait for durable base persistence.
///
/// Writes accumulate as pending until `commit` makes them durable in one
/// step; `rollback` drops them.
pub trait Storage: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Put a key-value pair
    fn put(&mut self, key: &[u8], value: &[u8]);

    /// Delete a key
    fn delete(&mut self, key: &[u8]);

    /// Commit pending changes
    fn commit(&mut self) -> Result<(), StateError>;

    /// Rollback pending changes
    fn rollback(&mut self);

    /// Get all keys with a given prefix
    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>>;
}

pub use file::FileStorage;
pub use memory::MemoryStorage;
