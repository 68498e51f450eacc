pub mod account;
pub mod address;
pub mod receipt;
pub mod value;

pub use account::Account;
pub use address::Address;
pub use receipt::{Receipt, TxStatus};
pub use value::Value;

/// Amount passed across the capability boundary.
///
/// Signed so that a negative argument is representable and can be rejected
/// with `InvalidAmount`; durable balances are `u64` and non-negative by
/// construction.
pub type Amount = i64;
