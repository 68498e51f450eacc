use serde::{Deserialize, Serialize};

use crate::types::value::Value;

/// Terminal status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// The root frame completed and its changes are durable
    Committed,
    /// An unhandled failure reached the root frame; no changes are durable
    Reverted,
}

/// What the coordinator hands back to the submitter: either the root result
/// value, or a revert indication with the root error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub status: TxStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Receipt {
    pub fn committed(result: Value) -> Self {
        Receipt {
            status: TxStatus::Committed,
            result: Some(result),
            error: None,
        }
    }

    pub fn reverted(error: impl Into<String>) -> Self {
        Receipt {
            status: TxStatus::Reverted,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_committed(&self) -> bool {
        self.status == TxStatus::Committed
    }
}
