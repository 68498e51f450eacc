use strata_core::{Address, Amount, Value};
use strata_state::TransactionState;
use tracing::debug;

use crate::code::{CodeRef, CodeRegistry};
use crate::error::RuntimeError;
use crate::executor::ExecutorConfig;
use crate::frame::{CallFrame, FrameStack, Outcome};

/// The capability surface handed to running contract code, bound to the
/// current top frame of one transaction's stack.
///
/// Every operation resolves against the active frame's snapshot and charges
/// one step from the transaction's step budget.
pub struct CallEnv<'a> {
    state: &'a mut TransactionState,
    stack: &'a mut FrameStack,
    registry: &'a CodeRegistry,
    config: &'a ExecutorConfig,
    steps: &'a mut u64,
    /// External initiator; the caller recorded for the root frame
    origin: Address,
}

impl<'a> CallEnv<'a> {
    pub(crate) fn new(
        state: &'a mut TransactionState,
        stack: &'a mut FrameStack,
        registry: &'a CodeRegistry,
        config: &'a ExecutorConfig,
        steps: &'a mut u64,
        origin: Address,
    ) -> Self {
        CallEnv {
            state,
            stack,
            registry,
            config,
            steps,
            origin,
        }
    }

    fn frame(&self) -> &CallFrame {
        self.stack
            .top()
            .expect("capability operation issued with no active frame")
    }

    fn charge_step(&mut self) -> Result<(), RuntimeError> {
        if *self.steps >= self.config.max_steps {
            return Err(RuntimeError::StepLimitExceeded(*self.steps));
        }
        *self.steps += 1;
        Ok(())
    }

    /// Address the active frame is executing as
    pub fn self_address(&self) -> Address {
        self.frame().target
    }

    /// Address that invoked the active frame
    pub fn caller(&self) -> Address {
        self.frame().caller
    }

    /// Balance of any account as visible in the active frame's snapshot;
    /// absent accounts read as zero
    pub fn balance(&mut self, addr: &Address) -> Result<u64, RuntimeError> {
        self.charge_step()?;
        let snapshot = self.frame().snapshot;
        Ok(self.state.balance(snapshot, addr)?)
    }

    /// Debit the frame's own address and credit `to` within the active
    /// snapshot
    pub fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), RuntimeError> {
        self.charge_step()?;
        let frame = self.frame();
        let (snapshot, from) = (frame.snapshot, frame.target);
        self.state.transfer(snapshot, &from, to, amount)?;
        Ok(())
    }

    /// Read a key from the active frame's own key-value space
    pub fn kv_get(&mut self, key: &str) -> Result<Option<Value>, RuntimeError> {
        self.charge_step()?;
        let frame = self.frame();
        let (snapshot, addr) = (frame.snapshot, frame.target);
        Ok(self.state.get(snapshot, &addr, key)?)
    }

    /// Write a key in the active frame's own key-value space
    pub fn kv_set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), RuntimeError> {
        self.charge_step()?;
        let frame = self.frame();
        let (snapshot, addr) = (frame.snapshot, frame.target);
        self.state.set(snapshot, &addr, key, value.into())?;
        Ok(())
    }

    /// Delete a key from the active frame's own key-value space
    pub fn kv_delete(&mut self, key: &str) -> Result<(), RuntimeError> {
        self.charge_step()?;
        let frame = self.frame();
        let (snapshot, addr) = (frame.snapshot, frame.target);
        self.state.delete(snapshot, &addr, key)?;
        Ok(())
    }

    /// Synchronously invoke code at `target` in a fresh child frame.
    ///
    /// The callee's failure is returned here as a catchable error value: its
    /// frame's writes are already discarded, the current frame's writes are
    /// untouched, and the caller decides whether to propagate or continue.
    pub fn call(&mut self, target: Address, code: CodeRef) -> Result<Value, RuntimeError> {
        self.charge_step()?;

        let depth = self.stack.depth();
        if depth >= self.config.max_call_depth {
            return Err(RuntimeError::CallStackOverflow {
                depth,
                max: self.config.max_call_depth,
            });
        }

        let code = match code {
            CodeRef::Registered => self
                .registry
                .get(&target)
                .ok_or(RuntimeError::NoSuchContract(target))?,
            CodeRef::Inline(code) => code,
        };

        let caller = self.stack.top().map(|f| f.target).unwrap_or(self.origin);
        let index = self.stack.push(self.state, caller, target).map_err(RuntimeError::from)?;

        // The env stays bound to "the current top frame", so the callee runs
        // against the frame just pushed.
        let result = code.run(self);

        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Failure,
        };
        self.stack.pop(self.state, index, outcome)?;

        if let Err(ref e) = result {
            debug!("call to {} failed: {}", target, e);
        }
        result
    }
}
