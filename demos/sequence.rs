//! # Example: sequence
//!
//! Composes deferred tasks and streams.
//!
//! Demonstrates how to:
//! - Chain tasks with [`DeferredTask::then`] and [`concat`].
//! - Relay one task from another with [`ValueSpec::relay`].
//! - Relay a `futures::Stream` with [`ValueSpec::stream`].
//! - Cancel a running sequence between steps.
//!
//! ## Flow
//! ```text
//! concat([a, b, c]) ──► a fires ──► values ──► a completes ──► b subscribed ──► ...
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example sequence
//! ```

use std::time::Duration;

use afterthought::{DelaySpec, FnSubscriber, ValueSpec, concat, deferred_task};
use futures::stream;

fn step(ms: u64, label: &'static str) -> afterthought::DeferredTask<String> {
    deferred_task(
        DelaySpec::after(Duration::from_millis(ms)),
        ValueSpec::thunk(move |()| format!("{label} after {ms}ms")),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Steps run back to back, never overlapping
    let (tx, rx) = tokio::sync::oneshot::channel();
    let _sub = concat([step(100, "first"), step(50, "second"), step(0, "third")]).subscribe(
        FnSubscriber::new()
            .on_value(|v: String| println!("[concat] {v}"))
            .on_complete(move || {
                let _ = tx.send(());
            }),
    );
    rx.await?;

    // 2. A task relaying a stream of three ticks, started only when it fires
    let ticks = deferred_task(
        DelaySpec::after(Duration::from_millis(50)),
        ValueSpec::stream(|| {
            stream::unfold(1u32, |n| async move {
                if n > 3 {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some((Ok::<_, String>(format!("tick {n}")), n + 1))
            })
        }),
    );
    let outer = deferred_task(DelaySpec::immediate(), ValueSpec::relay(ticks));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let _sub = outer.subscribe(
        FnSubscriber::new()
            .on_value(|v: String| println!("[stream] {v}"))
            .on_complete(move || {
                let _ = tx.send(());
            }),
    );
    rx.await?;

    // 3. Canceling between steps keeps what was delivered and drops the rest
    let chain = step(0, "kept").then(step(100, "dropped"));
    let sub = chain.subscribe(FnSubscriber::new().on_value(|v: String| println!("[cancel] {v}")));
    tokio::time::sleep(Duration::from_millis(20)).await;
    sub.unsubscribe();
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("[cancel] state={}", sub.state().as_label());

    Ok(())
}
