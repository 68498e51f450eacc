use std::collections::BTreeMap;

use strata_core::{Account, Address, Amount, Value};
use tracing::debug;

use crate::error::StateError;
use crate::snapshot::{Snapshot, SnapshotId, SnapshotStatus};

/// The state visible to one transaction: a private copy of the durable base
/// taken when the transaction began, plus an arena of copy-on-write
/// snapshots layered above it.
///
/// Snapshot `s0` is the transaction root; every call frame owns a child
/// snapshot somewhere above it. A snapshot's visible state is its own
/// recorded changes, falling back to its parent's visible state (and finally
/// the base copy) for anything unchanged.
pub struct TransactionState {
    base_accounts: BTreeMap<Address, Account>,
    base_kv: BTreeMap<(Address, String), Value>,
    snapshots: Vec<Snapshot>,
}

impl TransactionState {
    pub fn new(
        accounts: BTreeMap<Address, Account>,
        kv: BTreeMap<(Address, String), Value>,
    ) -> Self {
        TransactionState {
            base_accounts: accounts,
            base_kv: kv,
            snapshots: vec![Snapshot::new(None)],
        }
    }

    /// The transaction root snapshot
    pub fn root(&self) -> SnapshotId {
        SnapshotId(0)
    }

    /// Create a child snapshot layered over `parent`
    pub fn create_child(&mut self, parent: SnapshotId) -> Result<SnapshotId, StateError> {
        self.ensure_open(parent)?;
        let id = SnapshotId(self.snapshots.len());
        self.snapshots.push(Snapshot::new(Some(parent)));
        debug!("created snapshot {} (parent {})", id, parent);
        Ok(id)
    }

    /// Merge a snapshot's recorded changes into its parent.
    ///
    /// Balance deltas fold additively; KV entries (including tombstones)
    /// replace overlapping parent entries, last write wins. Terminal.
    pub fn commit(&mut self, id: SnapshotId) -> Result<(), StateError> {
        self.ensure_open(id)?;
        let parent = self
            .snapshot(id)?
            .parent
            .ok_or(StateError::RootSnapshot)?;

        let child = self.snapshot_mut(id)?;
        child.status = SnapshotStatus::Committed;
        let balances = std::mem::take(&mut child.balances);
        let kv = std::mem::take(&mut child.kv);

        let parent_snap = self.snapshot_mut(parent)?;
        for (addr, delta) in balances {
            *parent_snap.balances.entry(addr).or_insert(0) += delta;
        }
        for (key, entry) in kv {
            parent_snap.kv.insert(key, entry);
        }

        debug!("committed snapshot {} into {}", id, parent);
        Ok(())
    }

    /// Drop a snapshot's changes with no effect on its parent. Terminal.
    pub fn discard(&mut self, id: SnapshotId) -> Result<(), StateError> {
        self.ensure_open(id)?;
        let snap = self.snapshot_mut(id)?;
        snap.status = SnapshotStatus::Discarded;
        snap.balances.clear();
        snap.kv.clear();
        debug!("discarded snapshot {}", id);
        Ok(())
    }

    /// Read a key from `addr`'s key-value space as visible in `id`
    pub fn get(
        &self,
        id: SnapshotId,
        addr: &Address,
        key: &str,
    ) -> Result<Option<Value>, StateError> {
        self.ensure_open(id)?;
        let lookup = (*addr, key.to_string());
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let snap = self.snapshot(current)?;
            if let Some(entry) = snap.kv.get(&lookup) {
                return Ok(entry.clone());
            }
            cursor = snap.parent;
        }
        Ok(self.base_kv.get(&lookup).cloned())
    }

    /// Write a key in `addr`'s key-value space within `id`
    pub fn set(
        &mut self,
        id: SnapshotId,
        addr: &Address,
        key: &str,
        value: Value,
    ) -> Result<(), StateError> {
        self.ensure_open(id)?;
        let snap = self.snapshot_mut(id)?;
        snap.kv.insert((*addr, key.to_string()), Some(value));
        Ok(())
    }

    /// Delete a key from `addr`'s key-value space within `id`.
    ///
    /// Recorded as a tombstone so the deletion shadows any value visible in
    /// a parent layer. Deleting an absent key is a no-op tombstone.
    pub fn delete(&mut self, id: SnapshotId, addr: &Address, key: &str) -> Result<(), StateError> {
        self.ensure_open(id)?;
        let snap = self.snapshot_mut(id)?;
        snap.kv.insert((*addr, key.to_string()), None);
        Ok(())
    }

    /// Balance of `addr` as visible in `id`; absent accounts read as zero
    pub fn balance(&self, id: SnapshotId, addr: &Address) -> Result<u64, StateError> {
        self.ensure_open(id)?;
        let mut total: i128 = self
            .base_accounts
            .get(addr)
            .map(|a| a.balance as i128)
            .unwrap_or(0);
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let snap = self.snapshot(current)?;
            if let Some(delta) = snap.balances.get(addr) {
                total += delta;
            }
            cursor = snap.parent;
        }
        // Transfers are validated against the effective balance, so the sum
        // of base plus deltas can never go negative.
        debug_assert!(total >= 0, "negative effective balance for {}", addr);
        Ok(total.max(0) as u64)
    }

    /// Move `amount` from `from` to `to` within `id`
    pub fn transfer(
        &mut self,
        id: SnapshotId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), StateError> {
        if amount < 0 {
            return Err(StateError::InvalidAmount(amount));
        }
        let amount = amount as u64;
        let have = self.balance(id, from)?;
        if amount > have {
            return Err(StateError::InsufficientFunds { have, need: amount });
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        let snap = self.snapshot_mut(id)?;
        *snap.balances.entry(*from).or_insert(0) -= amount as i128;
        *snap.balances.entry(*to).or_insert(0) += amount as i128;
        Ok(())
    }

    /// Consume the transaction and return the root overlay, for folding into
    /// the durable base after the root frame has committed.
    pub fn into_changes(
        self,
    ) -> (
        BTreeMap<Address, i128>,
        BTreeMap<(Address, String), Option<Value>>,
    ) {
        let mut snapshots = self.snapshots;
        let root = snapshots.swap_remove(0);
        (root.balances, root.kv)
    }

    fn snapshot(&self, id: SnapshotId) -> Result<&Snapshot, StateError> {
        self.snapshots
            .get(id.0)
            .ok_or(StateError::UnknownSnapshot(id))
    }

    fn snapshot_mut(&mut self, id: SnapshotId) -> Result<&mut Snapshot, StateError> {
        self.snapshots
            .get_mut(id.0)
            .ok_or(StateError::UnknownSnapshot(id))
    }

    fn ensure_open(&self, id: SnapshotId) -> Result<(), StateError> {
        if self.snapshot(id)?.is_open() {
            Ok(())
        } else {
            Err(StateError::SnapshotClosed(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_state() -> TransactionState {
        TransactionState::new(BTreeMap::new(), BTreeMap::new())
    }

    fn funded_state(addr: Address, balance: u64) -> TransactionState {
        let mut accounts = BTreeMap::new();
        accounts.insert(addr, Account::with_balance(balance));
        TransactionState::new(accounts, BTreeMap::new())
    }

    #[test]
    fn test_child_sees_parent_writes() {
        let mut state = fresh_state();
        let owner = Address::from_name("owner");
        let root = state.root();

        state.set(root, &owner, "greeting", Value::from("hi")).unwrap();

        let child = state.create_child(root).unwrap();
        let seen = state.get(child, &owner, "greeting").unwrap();
        assert_eq!(seen, Some(Value::from("hi")));
    }

    #[test]
    fn test_commit_folds_into_parent() {
        let mut state = fresh_state();
        let owner = Address::from_name("owner");
        let root = state.root();

        let child = state.create_child(root).unwrap();
        state.set(child, &owner, "k", Value::from("v")).unwrap();

        // Not visible in the parent until committed
        assert_eq!(state.get(root, &owner, "k").unwrap(), None);

        state.commit(child).unwrap();
        assert_eq!(state.get(root, &owner, "k").unwrap(), Some(Value::from("v")));
    }

    #[test]
    fn test_discard_leaves_parent_untouched() {
        let mut state = fresh_state();
        let owner = Address::from_name("owner");
        let root = state.root();
        state.set(root, &owner, "k", Value::from("old")).unwrap();

        let child = state.create_child(root).unwrap();
        state.set(child, &owner, "k", Value::from("new")).unwrap();
        state.delete(child, &owner, "other").unwrap();
        state.discard(child).unwrap();

        assert_eq!(state.get(root, &owner, "k").unwrap(), Some(Value::from("old")));
    }

    #[test]
    fn test_tombstone_shadows_parent_value() {
        let mut state = fresh_state();
        let owner = Address::from_name("owner");
        let root = state.root();
        state.set(root, &owner, "k", Value::from("v")).unwrap();

        let child = state.create_child(root).unwrap();
        state.delete(child, &owner, "k").unwrap();

        assert_eq!(state.get(child, &owner, "k").unwrap(), None);
        // Parent still sees the value until the child commits
        assert_eq!(state.get(root, &owner, "k").unwrap(), Some(Value::from("v")));

        state.commit(child).unwrap();
        assert_eq!(state.get(root, &owner, "k").unwrap(), None);
    }

    #[test]
    fn test_commit_is_terminal() {
        let mut state = fresh_state();
        let root = state.root();
        let child = state.create_child(root).unwrap();

        state.commit(child).unwrap();
        assert!(matches!(
            state.commit(child),
            Err(StateError::SnapshotClosed(_))
        ));
        assert!(matches!(
            state.discard(child),
            Err(StateError::SnapshotClosed(_))
        ));
    }

    #[test]
    fn test_root_cannot_commit() {
        let mut state = fresh_state();
        let root = state.root();
        assert!(matches!(state.commit(root), Err(StateError::RootSnapshot)));
    }

    #[test]
    fn test_transfer_and_delta_folding() {
        let alice = Address::from_name("alice");
        let bob = Address::from_name("bob");
        let mut state = funded_state(alice, 100);
        let root = state.root();

        let child = state.create_child(root).unwrap();
        state.transfer(child, &alice, &bob, 10).unwrap();

        assert_eq!(state.balance(child, &alice).unwrap(), 90);
        assert_eq!(state.balance(child, &bob).unwrap(), 10);
        // Parent unchanged until commit
        assert_eq!(state.balance(root, &alice).unwrap(), 100);

        state.commit(child).unwrap();
        assert_eq!(state.balance(root, &alice).unwrap(), 90);
        assert_eq!(state.balance(root, &bob).unwrap(), 10);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let alice = Address::from_name("alice");
        let bob = Address::from_name("bob");
        let mut state = funded_state(alice, 5);
        let root = state.root();

        let result = state.transfer(root, &alice, &bob, 10);
        assert!(matches!(
            result,
            Err(StateError::InsufficientFunds { have: 5, need: 10 })
        ));
    }

    #[test]
    fn test_transfer_negative_amount() {
        let alice = Address::from_name("alice");
        let bob = Address::from_name("bob");
        let mut state = funded_state(alice, 100);
        let root = state.root();

        assert!(matches!(
            state.transfer(root, &alice, &bob, -1),
            Err(StateError::InvalidAmount(-1))
        ));
    }

    #[test]
    fn test_nested_transfer_respects_uncommitted_spend() {
        let alice = Address::from_name("alice");
        let bob = Address::from_name("bob");
        let mut state = funded_state(alice, 100);
        let root = state.root();

        let outer = state.create_child(root).unwrap();
        state.transfer(outer, &alice, &bob, 80).unwrap();

        // The inner frame sees the outer frame's debit
        let inner = state.create_child(outer).unwrap();
        assert_eq!(state.balance(inner, &alice).unwrap(), 20);
        assert!(matches!(
            state.transfer(inner, &alice, &bob, 30),
            Err(StateError::InsufficientFunds { have: 20, need: 30 })
        ));
    }

    #[test]
    fn test_into_changes_carries_root_overlay() {
        let owner = Address::from_name("owner");
        let mut state = fresh_state();
        let root = state.root();
        state.set(root, &owner, "k", Value::from("v")).unwrap();

        let (balances, kv) = state.into_changes();
        assert!(balances.is_empty());
        assert_eq!(
            kv.get(&(owner, "k".to_string())),
            Some(&Some(Value::from("v")))
        );
    }
}
