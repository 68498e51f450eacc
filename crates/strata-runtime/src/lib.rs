//! Strata Runtime - Contract invocation engine
//!
//! This crate provides the call frame stack, the capability surface bound to
//! the active frame, the executor that runs contract code, and the
//! transaction coordinator with all-or-nothing durability.

pub mod code;
pub mod coordinator;
pub mod env;
pub mod error;
pub mod executor;
pub mod frame;

pub use code::{code_fn, CodeRef, CodeRegistry, ContractCode};
pub use coordinator::Coordinator;
pub use env::CallEnv;
pub use error::RuntimeError;
pub use executor::{Executor, ExecutorConfig};
pub use frame::{CallFrame, FrameStack, FrameStatus, Outcome};
