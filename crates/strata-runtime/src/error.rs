use thiserror::Error;

use strata_core::{Address, Value};
use strata_state::StateError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("No contract registered at {0}")]
    NoSuchContract(Address),

    #[error("Call depth {depth} exceeds maximum {max}")]
    CallStackOverflow { depth: usize, max: usize },

    #[error("Step budget exhausted after {0} steps")]
    StepLimitExceeded(u64),

    #[error("Contract signaled failure: {0}")]
    Signal(Value),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl RuntimeError {
    /// A user-signaled failure carrying an arbitrary value
    pub fn signal(value: impl Into<Value>) -> Self {
        RuntimeError::Signal(value.into())
    }
}
