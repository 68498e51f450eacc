use std::sync::{Arc, Mutex};

use anyhow::Result;
use strata_core::{Address, Value};
use strata_runtime::{code_fn, CodeRef, Coordinator, Executor, ExecutorConfig, RuntimeError};
use strata_state::{FileStorage, StateStore};
use tracing::info;

/// The two accounts the demos operate on
pub fn demo_addresses() -> (Address, Address) {
    (Address::from_name("alice"), Address::from_name("bob"))
}

/// Transfer between the demo accounts and print balances before and after
pub fn run_transfer(store: StateStore<FileStorage>, amount: i64) -> Result<()> {
    let (alice, bob) = demo_addresses();

    let mut executor = Executor::new(ExecutorConfig::default());
    executor.register(
        alice,
        code_fn(move |env| {
            info!("balance of {}: {}", alice, env.balance(&alice)?);
            info!("balance of {}: {}", bob, env.balance(&bob)?);
            info!("transferring {} from {} to {}", amount, alice, bob);
            env.transfer(&bob, amount)?;
            info!("balance of {}: {}", alice, env.balance(&alice)?);
            info!("balance of {}: {}", bob, env.balance(&bob)?);
            Ok(Value::Null)
        }),
    );

    let coordinator = Coordinator::new(Arc::new(Mutex::new(store)), executor);
    let receipt = coordinator.submit(Address::ZERO, alice, CodeRef::Registered);

    print_receipt(&receipt);
    Ok(())
}

/// The nested-call revert scenario: one callee write survives, a second
/// callee deletes it and fails, and the deletion is discarded.
pub fn run_revert(store: StateStore<FileStorage>) -> Result<()> {
    let (handler, other) = demo_addresses();

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
                    Err(RuntimeError::signal(
                        "Ha ha ha I deleted your key and threw an error",
                    ))
                })),
            );
            if let Err(error) = failed {
                info!("caught: {}", error);
            }

            env.call(
                other,
                CodeRef::Inline(code_fn(|env| {
                    let value = env.kv_get("key")?.unwrap_or(Value::Null);
                    info!("key reads back as: {}", value);
                    Ok(value)
                })),
            )
        }),
    );

    let coordinator = Coordinator::new(Arc::new(Mutex::new(store)), executor);
    let receipt = coordinator.submit(Address::ZERO, handler, CodeRef::Registered);

    print_receipt(&receipt);
    Ok(())
}

fn print_receipt(receipt: &strata_core::Receipt) {
    match (&receipt.result, &receipt.error) {
        (Some(result), _) => println!("{:?}: {}", receipt.status, result),
        (None, Some(error)) => println!("{:?}: {}", receipt.status, error),
        (None, None) => println!("{:?}", receipt.status),
    }
}
