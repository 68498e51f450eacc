use strata_core::Address;
use thiserror::Error;

use crate::snapshot::SnapshotId;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Unknown snapshot: {0}")]
    UnknownSnapshot(SnapshotId),

    #[error("Snapshot {0} has already been committed or discarded")]
    SnapshotClosed(SnapshotId),

    #[error("The root snapshot has no parent to commit into")]
    RootSnapshot,

    #[error("Commit conflict: a concurrent commit already spent the balance of {0}")]
    CommitConflict(Address),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Core error: {0}")]
    Core(#[from] strata_core::CoreError),
}
