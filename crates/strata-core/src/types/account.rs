use serde::{Deserialize, Serialize};

/// An account in the durable base state.
///
/// Accounts are created implicitly on first reference with a zero balance;
/// the balance only changes through a transfer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Account {
    /// Available balance, non-negative by construction
    pub balance: u64,
}

impl Account {
    pub fn with_balance(balance: u64) -> Self {
        Account { balance }
    }

    /// Credit the balance
    pub fn credit(&mut self, amount: u64) {
        self.balance += amount;
    }

    /// Debit the balance (assumes caller has checked availability)
    pub fn debit(&mut self, amount: u64) {
        self.balance -= amount;
    }
}
