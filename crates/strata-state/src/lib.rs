//! Strata State - Versioned state management and storage
//!
//! This crate provides the durable base store, storage backends, and the
//! per-transaction snapshot chain that gives contract frames their isolated,
//! copy-on-write view of balances and key-value spaces.

pub mod error;
pub mod snapshot;
pub mod state;
pub mod storage;
pub mod store;

pub use error::StateError;
pub use snapshot::{SnapshotId, SnapshotStatus};
pub use state::TransactionState;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::StateStore;
