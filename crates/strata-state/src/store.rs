use std::collections::BTreeMap;

use strata_core::{serialize, Account, Address, Value};
use tracing::{debug, info};

use crate::error::StateError;
use crate::state::TransactionState;
use crate::storage::Storage;

/// Key prefixes for storage
mod keys {
    pub const ACCOUNT: &[u8] = b"acc:";
    pub const KV: &[u8] = b"kv:";
}

/// The durable base: every account's balance and key-value space, backed by
/// a storage engine.
///
/// Transactions never touch the base directly. `begin` hands out a
/// [`TransactionState`] holding a private copy of the base as of that
/// instant (snapshot isolation), and `apply` folds a completed root overlay
/// back in atomically. Callers that run transactions concurrently serialize
/// `begin`/`apply` by holding the store behind a mutex. Overlapping commits
/// merge: balance deltas fold additively, KV writes to the same key resolve
/// last-committer-wins. A fold that would take any balance below zero means
/// a concurrent commit already spent those funds; the apply is rejected as
/// a conflict.
pub struct StateStore<S: Storage> {
    storage: S,
    accounts: BTreeMap<Address, Account>,
    kv: BTreeMap<(Address, String), Value>,
}

impl<S: Storage> StateStore<S> {
    /// Create an empty store over the given storage backend
    pub fn new(storage: S) -> Self {
        StateStore {
            storage,
            accounts: BTreeMap::new(),
            kv: BTreeMap::new(),
        }
    }

    /// Open a store, loading any previously persisted state
    pub fn open(storage: S) -> Result<Self, StateError> {
        let mut store = StateStore::new(storage);
        store.load()?;
        Ok(store)
    }

    /// Begin a transaction against the base as of now
    pub fn begin(&self) -> TransactionState {
        TransactionState::new(self.accounts.clone(), self.kv.clone())
    }

    /// Fold a completed transaction's root overlay into the base and persist.
    ///
    /// All-or-nothing: either every change in the overlay becomes durable or
    /// the base (in memory and in storage) is left untouched. Returns
    /// [`StateError::CommitConflict`] if folding a balance delta would go
    /// below zero, which means a concurrent commit spent the same funds
    /// after this transaction began.
    pub fn apply(&mut self, tx: TransactionState) -> Result<(), StateError> {
        let (balances, kv) = tx.into_changes();

        // Stage everything first; the base changes only after the storage
        // commit succeeds.
        let mut staged_accounts: BTreeMap<Address, Account> = BTreeMap::new();
        let mut account_writes: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        for (addr, delta) in balances {
            // The transaction validated its transfers against its own begin
            // snapshot, not against commits that landed since.
            let have = self.accounts.get(&addr).map(|a| a.balance).unwrap_or(0);
            let updated = have as i128 + delta;
            if updated < 0 {
                return Err(StateError::CommitConflict(addr));
            }
            let account = Account::with_balance(updated as u64);
            let bytes = serialize::to_bytes(&account)
                .map_err(|e| StateError::Serialization(e.to_string()))?;
            account_writes.push((account_key(&addr), bytes));
            staged_accounts.insert(addr, account);
        }

        let mut staged_kv: Vec<((Address, String), Option<Value>)> = Vec::new();
        let mut kv_writes: Vec<(Vec<u8>, Option<Vec<u8>>)> = Vec::new();
        for ((addr, key), entry) in kv {
            let storage_key = kv_key(&addr, &key);
            let bytes = match &entry {
                Some(value) => Some(
                    serialize::to_bytes(value)
                        .map_err(|e| StateError::Serialization(e.to_string()))?,
                ),
                None => None,
            };
            kv_writes.push((storage_key, bytes));
            staged_kv.push(((addr, key), entry));
        }

        for (key, bytes) in account_writes {
            self.storage.put(&key, &bytes);
        }
        for (key, bytes) in kv_writes {
            match bytes {
                Some(bytes) => self.storage.put(&key, &bytes),
                None => self.storage.delete(&key),
            }
        }
        if let Err(e) = self.storage.commit() {
            self.storage.rollback();
            return Err(e);
        }

        for (addr, account) in staged_accounts {
            self.accounts.insert(addr, account);
        }
        for ((addr, key), entry) in staged_kv {
            match entry {
                Some(value) => {
                    self.kv.insert((addr, key), value);
                }
                None => {
                    self.kv.remove(&(addr, key));
                }
            }
        }
        debug!("applied transaction changes to durable base");
        Ok(())
    }

    /// Balance of an account; absent accounts read as zero
    pub fn balance(&self, addr: &Address) -> u64 {
        self.accounts.get(addr).map(|a| a.balance).unwrap_or(0)
    }

    /// Read a key from an account's key-value space
    pub fn get(&self, addr: &Address, key: &str) -> Option<&Value> {
        self.kv.get(&(*addr, key.to_string()))
    }

    /// Sum of all balances (invariant across any transaction)
    pub fn total_supply(&self) -> u64 {
        self.accounts.values().map(|a| a.balance).sum()
    }

    /// Credit an account directly. Genesis funding only; everything after
    /// genesis moves through transfers.
    pub fn credit(&mut self, addr: &Address, amount: u64) {
        self.accounts.entry(*addr).or_default().credit(amount);
    }

    /// Persist the full base to storage
    pub fn persist(&mut self) -> Result<(), StateError> {
        for (addr, account) in &self.accounts {
            let bytes = serialize::to_bytes(account)
                .map_err(|e| StateError::Serialization(e.to_string()))?;
            self.storage.put(&account_key(addr), &bytes);
        }
        for ((addr, key), value) in &self.kv {
            let bytes = serialize::to_bytes(value)
                .map_err(|e| StateError::Serialization(e.to_string()))?;
            self.storage.put(&kv_key(addr, key), &bytes);
        }
        self.storage.commit()?;
        info!("persisted {} accounts", self.accounts.len());
        Ok(())
    }

    /// Load the base from storage into memory
    pub fn load(&mut self) -> Result<(), StateError> {
        self.accounts.clear();
        self.kv.clear();

        for key in self.storage.keys_with_prefix(keys::ACCOUNT) {
            if let Some(bytes) = self.storage.get(&key) {
                let addr_bytes = &key[keys::ACCOUNT.len()..];
                if let Some(addr) = Address::from_slice(addr_bytes) {
                    let account = serialize::from_bytes(&bytes)
                        .map_err(|e| StateError::Serialization(e.to_string()))?;
                    self.accounts.insert(addr, account);
                }
            }
        }

        for key in self.storage.keys_with_prefix(keys::KV) {
            if let Some(bytes) = self.storage.get(&key) {
                let rest = &key[keys::KV.len()..];
                if rest.len() < 33 || rest[32] != b':' {
                    continue;
                }
                let addr_bytes = &rest[..32];
                let key_bytes = &rest[33..];
                if let Some(addr) = Address::from_slice(addr_bytes) {
                    if let Ok(kv_key) = String::from_utf8(key_bytes.to_vec()) {
                        let value = serialize::from_bytes(&bytes)
                            .map_err(|e| StateError::Serialization(e.to_string()))?;
                        self.kv.insert((addr, kv_key), value);
                    }
                }
            }
        }

        debug!("loaded {} accounts from storage", self.accounts.len());
        Ok(())
    }
}

/// Format an account storage key
fn account_key(addr: &Address) -> Vec<u8> {
    [keys::ACCOUNT, addr.as_bytes()].concat()
}

/// Format a KV storage key
fn kv_key(addr: &Address, key: &str) -> Vec<u8> {
    let mut storage_key = keys::KV.to_vec();
    storage_key.extend_from_slice(addr.as_bytes());
    storage_key.push(b':');
    storage_key.extend_from_slice(key.as_bytes());
    storage_key
}
