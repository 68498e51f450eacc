//! Nested-call failure handling: a failed callee's writes are discarded
//! without rolling back the caller or earlier sibling calls.

use std::sync::{Arc, Mutex};

use strata_core::{Address, Value};
use strata_runtime::{code_fn, CodeRef, Coordinator, Executor, ExecutorConfig, RuntimeError};
use strata_state::{MemoryStorage, StateStore};

fn coordinator_with(
    balances: &[(Address, u64)],
    executor: Executor,
) -> Coordinator<MemoryStorage> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut store = StateStore::new(MemoryStorage::new());
    for (addr, balance) in balances {
        store.credit(addr, *balance);
    }
    Coordinator::new(Arc::new(Mutex::new(store)), executor)
}

#[test]
fn failed_delete_is_discarded_after_successful_set() {
    // The motivating sequence: a first nested call stores a key, a second
    // nested call deletes it and then signals failure. The caller catches
    // the failure; the deletion must not survive.
    let handler = Address::from_name("handler");
    let other = Address::from_name("other");

    let mut executor = Executor::new(ExecutorConfig::default());
    executor.register(
        handler,
        code_fn(move |env| {
            env.call(
                other,
                CodeRef::Inline(code_fn(|env| {
                    env.kv_set("key", "Hello World")?;
                    Ok(Value::Null)
                })),
            )?;

            let failed = env.call(
                other,
                CodeRef::Inline(code_fn(|env| {
                    env.kv_delete("key")?;
                    Err(RuntimeError::signal("I deleted your key and threw"))
                })),
            );
            assert!(matches!(failed, Err(RuntimeError::Signal(_))));

            // Execution continues in the caller after catching the error
            env.call(
                other,
                CodeRef::Inline(code_fn(|env| {
                    Ok(env.kv_get("key")?.unwrap_or(Value::Null))
                })),
            )
        }),
    );

    let coordinator = coordinator_with(&[], executor);
    let receipt = coordinator.submit(Address::ZERO, handler, CodeRef::Registered);

    assert!(receipt.is_committed());
    // The third call already observed the surviving value...
    assert_eq!(receipt.result, Some(Value::from("Hello World")));

    // ...and it is what ends up durable.
    let store = coordinator.store();
    let store = store.lock().unwrap();
    assert_eq!(store.get(&other, "key"), Some(&Value::from("Hello World")));
}

#[test]
fn discarded_writes_never_reach_any_frame() {
    let handler = Address::from_name("handler");
    let callee = Address::from_name("callee");

    let mut executor = Executor::new(ExecutorConfig::default());
    executor.register(
        handler,
        code_fn(move |env| {
            let failed = env.call(
                callee,
                CodeRef::Inline(code_fn(|env| {
                    env.kv_set("ghost", "should never be seen")?;
                    Err(RuntimeError::signal("abort"))
                })),
            );
            assert!(failed.is_err());

            // The discarded write is invisible to the parent frame
            let seen = env.call(
                callee,
                CodeRef::Inline(code_fn(|env| {
                    Ok(env.kv_get("ghost")?.unwrap_or(Value::Null))
                })),
            )?;
            assert_eq!(seen, Value::Null);
            Ok(Value::Null)
        }),
    );

    let coordinator = coordinator_with(&[], executor);
    let receipt = coordinator.submit(Address::ZERO, handler, CodeRef::Registered);
    assert!(receipt.is_committed());

    let store = coordinator.store();
    let store = store.lock().unwrap();
    assert_eq!(store.get(&callee, "ghost"), None);
}

#[test]
fn sibling_success_survives_later_sibling_failure() {
    let handler = Address::from_name("handler");
    let first = Address::from_name("first");
    let second = Address::from_name("second");

    let mut executor = Executor::new(ExecutorConfig::default());
    executor.register(
        handler,
        code_fn(move |env| {
            env.kv_set("own", "caller write")?;

            env.call(
                first,
                CodeRef::Inline(code_fn(|env| {
                    env.kv_set("done", Value::from(true))?;
                    Ok(Value::Null)
                })),
            )?;

            let failed = env.call(
                second,
                CodeRef::Inline(code_fn(|env| {
                    env.kv_set("done", Value::from(true))?;
                    Err(RuntimeError::signal("second fails"))
                })),
            );
            assert!(failed.is_err());
            Ok(Value::Null)
        }),
    );

    let coordinator = coordinator_with(&[], executor);
    let receipt = coordinator.submit(Address::ZERO, handler, CodeRef::Registered);
    assert!(receipt.is_committed());

    let store = coordinator.store();
    let store = store.lock().unwrap();
    // The earlier sibling's write and the caller's own write survive
    assert_eq!(store.get(&first, "done"), Some(&Value::from(true)));
    assert_eq!(store.get(&handler, "own"), Some(&Value::from("caller write")));
    // The failed sibling's write does not
    assert_eq!(store.get(&second, "done"), None);
}

#[test]
fn propagated_failure_cascades_to_full_revert() {
    let handler = Address::from_name("handler");
    let callee = Address::from_name("callee");

    let mut executor = Executor::new(ExecutorConfig::default());
    executor.register(
        handler,
        code_fn(move |env| {
            env.kv_set("own", "will be reverted")?;
            // Propagate the callee's failure instead of catching it
            env.call(
                callee,
                CodeRef::Inline(code_fn(|_env| Err(RuntimeError::signal("fatal")))),
            )
        }),
    );

    let coordinator = coordinator_with(&[], executor);
    let receipt = coordinator.submit(Address::ZERO, handler, CodeRef::Registered);

    assert!(!receipt.is_committed());
    let store = coordinator.store();
    let store = store.lock().unwrap();
    assert_eq!(store.get(&handler, "own"), None);
}

#[test]
fn failed_nested_transfer_is_discarded() {
    let handler = Address::from_name("handler");
    let payer = Address::from_name("payer");
    let payee = Address::from_name("payee");

    let mut executor = Executor::new(ExecutorConfig::default());
    executor.register(
        handler,
        code_fn(move |env| {
            let failed = env.call(
                payer,
                CodeRef::Inline(code_fn(move |env| {
                    env.transfer(&Address::from_name("payee"), 25)?;
                    Err(RuntimeError::signal("changed my mind"))
                })),
            );
            assert!(failed.is_err());
            Ok(Value::from(env.balance(&payer)? as i64))
        }),
    );

    let coordinator = coordinator_with(&[(payer, 50)], executor);
    let receipt = coordinator.submit(Address::ZERO, handler, CodeRef::Registered);

    assert!(receipt.is_committed());
    // The caller already saw the discarded transfer undone
    assert_eq!(receipt.result, Some(Value::from(50i64)));

    let store = coordinator.store();
    let store = store.lock().unwrap();
    assert_eq!(store.balance(&payer), 50);
    assert_eq!(store.balance(&payee), 0);
}
