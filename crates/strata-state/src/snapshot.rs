use std::collections::BTreeMap;
use std::fmt;

use strata_core::{Address, Value};

/// Index of a snapshot within one transaction's snapshot arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotId(pub(crate) usize);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Lifecycle of a snapshot. Commit and discard are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Open,
    Committed,
    Discarded,
}

/// One layer of the copy-on-write chain: the changes a single frame has made
/// on top of its parent's view.
#[derive(Debug)]
pub(crate) struct Snapshot {
    /// Parent layer; `None` for the transaction root
    pub(crate) parent: Option<SnapshotId>,
    pub(crate) status: SnapshotStatus,
    /// Signed balance deltas, folded additively into the parent on commit
    pub(crate) balances: BTreeMap<Address, i128>,
    /// KV overlay; `None` is a deletion tombstone. Last write wins.
    pub(crate) kv: BTreeMap<(Address, String), Option<Value>>,
}

impl Snapshot {
    pub(crate) fn new(parent: Option<SnapshotId>) -> Self {
        Snapshot {
            parent,
            status: SnapshotStatus::Open,
            balances: BTreeMap::new(),
            kv: BTreeMap::new(),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.status == SnapshotStatus::Open
    }
}
