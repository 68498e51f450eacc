use std::collections::BTreeMap;
use std::sync::Arc;

use strata_core::{Address, Value};

use crate::env::CallEnv;
use crate::error::RuntimeError;

/// Contract code invocable by the executor.
///
/// Code observes and mutates state only through the capability surface it is
/// handed; returning `Err` signals failure, which discards the frame's
/// writes and surfaces at the caller's call site.
pub trait ContractCode: Send + Sync {
    fn run(&self, env: &mut CallEnv<'_>) -> Result<Value, RuntimeError>;
}

impl<F> ContractCode for F
where
    F: Fn(&mut CallEnv<'_>) -> Result<Value, RuntimeError> + Send + Sync,
{
    fn run(&self, env: &mut CallEnv<'_>) -> Result<Value, RuntimeError> {
        self(env)
    }
}

/// Wrap a closure as contract code
pub fn code_fn<F>(f: F) -> Arc<dyn ContractCode>
where
    F: Fn(&mut CallEnv<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What to run at a target address: the code registered there, or code
/// supplied inline by the caller.
#[derive(Clone)]
pub enum CodeRef {
    Registered,
    Inline(Arc<dyn ContractCode>),
}

impl std::fmt::Debug for CodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeRef::Registered => write!(f, "CodeRef::Registered"),
            CodeRef::Inline(_) => write!(f, "CodeRef::Inline"),
        }
    }
}

/// Registry of code deployed at addresses
#[derive(Default, Clone)]
pub struct CodeRegistry {
    contracts: BTreeMap<Address, Arc<dyn ContractCode>>,
}

impl CodeRegistry {
    pub fn new() -> Self {
        CodeRegistry::default()
    }

    /// Register (or replace) the code at an address
    pub fn register(&mut self, addr: Address, code: Arc<dyn ContractCode>) {
        self.contracts.insert(addr, code);
    }

    pub fn get(&self, addr: &Address) -> Option<Arc<dyn ContractCode>> {
        self.contracts.get(addr).cloned()
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.contracts.contains_key(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CodeRegistry::new();
        let addr = Address::from_name("counter");
        assert!(!registry.contains(&addr));

        registry.register(addr, code_fn(|_env| Ok(Value::from(1))));
        assert!(registry.contains(&addr));
        assert!(registry.get(&addr).is_some());
        assert!(registry.get(&Address::from_name("missing")).is_none());
    }
}
