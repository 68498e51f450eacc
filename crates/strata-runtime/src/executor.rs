use std::sync::Arc;

use strata_core::{Address, Value};
use strata_state::TransactionState;
use tracing::debug;

use crate::code::{CodeRef, CodeRegistry, ContractCode};
use crate::env::CallEnv;
use crate::error::RuntimeError;
use crate::frame::FrameStack;

/// Execution limits for one transaction
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum nesting of `call` invocations
    pub max_call_depth: usize,
    /// Capability-operation budget for the whole transaction
    pub max_steps: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            max_call_depth: 64,
            max_steps: 100_000,
        }
    }
}

/// Runs contract code against a transaction's state, frame by frame
pub struct Executor {
    registry: CodeRegistry,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Executor {
            registry: CodeRegistry::new(),
            config,
        }
    }

    /// Deploy code at an address
    pub fn register(&mut self, addr: Address, code: Arc<dyn ContractCode>) {
        self.registry.register(addr, code);
    }

    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `code` at `entry` as the root invocation of a transaction.
    ///
    /// On `Ok` the root frame's changes have been committed into the
    /// transaction root snapshot; on `Err` they have been discarded and the
    /// transaction root is exactly as it was.
    pub fn execute(
        &self,
        state: &mut TransactionState,
        origin: Address,
        entry: Address,
        code: CodeRef,
    ) -> Result<Value, RuntimeError> {
        debug!("executing entry {} for origin {}", entry, origin);
        let mut stack = FrameStack::new();
        let mut steps = 0u64;
        let mut env = CallEnv::new(
            state,
            &mut stack,
            &self.registry,
            &self.config,
            &mut steps,
            origin,
        );
        env.call(entry, code)
    }
}
