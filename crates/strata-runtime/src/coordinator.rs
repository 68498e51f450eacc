use std::sync::{Arc, Mutex, PoisonError};

use strata_core::{Address, Receipt};
use strata_state::{StateStore, Storage};
use tracing::{debug, info, warn};

use crate::code::CodeRef;
use crate::executor::Executor;

/// Establishes the root frame for an external request and makes the outcome
/// durable: `Pending -> Running -> Committed | Reverted`.
///
/// Each submission runs against a private copy of the base taken at begin
/// (snapshot isolation); the shared store serializes begin/apply, and
/// overlapping commits merge (balance deltas fold additively, KV writes
/// resolve last-committer-wins). A commit whose deltas no longer fit the
/// base, because a concurrent commit spent the same funds, is rejected by
/// the store and reported as `Reverted`.
pub struct Coordinator<S: Storage> {
    store: Arc<Mutex<StateStore<S>>>,
    executor: Executor,
}

impl<S: Storage> Coordinator<S> {
    pub fn new(store: Arc<Mutex<StateStore<S>>>, executor: Executor) -> Self {
        Coordinator { store, executor }
    }

    pub fn store(&self) -> Arc<Mutex<StateStore<S>>> {
        Arc::clone(&self.store)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run one transaction: invoke `code` at `entry` on behalf of `origin`.
    ///
    /// Commits the root snapshot into the durable base on success; discards
    /// everything if an unhandled failure reaches the root frame. Either
    /// way, the submitter gets a receipt.
    pub fn submit(&self, origin: Address, entry: Address, code: CodeRef) -> Receipt {
        let mut tx = self
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin();
        debug!("transaction running: origin {} entry {}", origin, entry);

        match self.executor.execute(&mut tx, origin, entry, code) {
            Ok(value) => {
                let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
                match store.apply(tx) {
                    Ok(()) => {
                        info!("transaction committed: entry {}", entry);
                        Receipt::committed(value)
                    }
                    Err(e) => {
                        warn!("transaction reverted: durable apply failed: {}", e);
                        Receipt::reverted(e.to_string())
                    }
                }
            }
            Err(e) => {
                // Dropping the transaction state discards the whole snapshot
                // chain; nothing reaches the durable base.
                info!("transaction reverted: {}", e);
                Receipt::reverted(e.to_string())
            }
        }
    }
}
