//! # Example: observers
//!
//! Tracks tasks through a [`Tracker`], with the built-in [`LogWriter`] and a
//! custom [`Observe`] implementation.
//!
//! Demonstrates how to:
//! - Build a tracker with observers.
//! - Create named tasks whose lifecycle events reach the observers.
//! - Inspect live invocations and cancel them in bulk.
//!
//! ## Flow
//! ```text
//! tracker.task() ──► subscribe() ──► Invocation ── publish ──► Bus
//!                                                             └─► listener
//!                                                                  ├─► AliveTracker
//!                                                                  └─► ObserverSet ──► LogWriter / Failures
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example observers --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use afterthought::{Config, DelaySpec, Event, EventKind, LogWriter, Observe, Tracker, ValueSpec};
use async_trait::async_trait;

/// Counts errored invocations.
#[derive(Default)]
struct Failures {
    count: AtomicUsize,
}

#[async_trait]
impl Observe for Failures {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::InvocationErrored {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn name(&self) -> &'static str {
        "failures"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let failures = Arc::new(Failures::default());
    let observers: Vec<Arc<dyn Observe>> = vec![Arc::new(LogWriter::new()), failures.clone()];
    let tracker = Tracker::builder(Config::default())
        .with_observers(observers)
        .build()?;

    let greet = tracker
        .task(DelaySpec::after(Duration::from_millis(100)), ValueSpec::literal("hi"))
        .with_name("greet");
    let broken = tracker
        .task(
            DelaySpec::after(Duration::from_millis(50)),
            ValueSpec::try_thunk(|()| Err::<&str, _>("no greeting today")),
        )
        .with_name("broken");
    let slow = tracker
        .task(DelaySpec::after(Duration::from_secs(60)), ValueSpec::literal("late"))
        .with_name("slow");

    let _a = greet.subscribe_fn(|v| println!("[app] greet -> {v}"));
    let _b = broken.subscribe_fn(|v| println!("[app] broken -> {v}"));
    let _c = slow.subscribe_fn(|v| println!("[app] slow -> {v}"));

    tokio::time::sleep(Duration::from_millis(10)).await;
    for live in tracker.live().await {
        println!("[app] live id={} task={:?} state={}", live.id, live.task, live.state.as_label());
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("[app] still live: {}", tracker.live_count());
    println!("[app] canceled {} invocation(s)", tracker.cancel_all());

    tracker.shutdown().await;
    println!("[app] failures seen: {}", failures.count.load(Ordering::Relaxed));
    Ok(())
}
