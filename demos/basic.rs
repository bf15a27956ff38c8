//! # Example: basic
//!
//! The three delay kinds, both protocols, and cancellation.
//!
//! Demonstrates how to:
//! - Fire synchronously with [`DelaySpec::immediate`] (or `after(0.0, ..)`).
//! - Await a duration-delayed thunk once.
//! - Feed a signal's value into the value thunk.
//! - Cancel an activation before it fires.
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::time::Duration;

use afterthought::{DelaySpec, FnSubscriber, Signal, ValueSpec, after, deferred_task};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Immediate: delivered before subscribe() returns
    let hello = after(0.0, || "hello")?;
    let _sub = hello.subscribe(
        FnSubscriber::new()
            .on_value(|v: &str| println!("[immediate] value={v}"))
            .on_complete(|| println!("[immediate] complete")),
    );

    // 2. Duration, awaited once (each await is a fresh activation)
    let answer = deferred_task(
        DelaySpec::millis(200.0)?,
        ValueSpec::thunk(|()| 6 * 7),
    );
    println!("[duration] awaited {}", answer.clone().await?);
    println!("[duration] awaited again {}", answer.await?);

    // 3. Signal settled later; its value feeds the thunk
    let (settler, signal) = Signal::channel();
    let doubled = deferred_task(DelaySpec::signal(signal), ValueSpec::thunk(|n: u32| n * 2));
    let pending = tokio::spawn(doubled.await_once());
    tokio::time::sleep(Duration::from_millis(50)).await;
    settler.resolve(21);
    println!("[signal] resolved {}", pending.await??);

    // 4. Cancel before fire: nothing is delivered
    let never = deferred_task(
        DelaySpec::after(Duration::from_millis(100)),
        ValueSpec::thunk(|()| println!("[cancel] this never prints")),
    );
    let sub = never.subscribe_fn(|()| {});
    println!("[cancel] unsubscribed={}", sub.unsubscribe());
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("[cancel] state={}", sub.state().as_label());

    Ok(())
}
