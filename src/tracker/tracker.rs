//! # Tracker: event wiring, live view and bulk cancellation for tasks.
//!
//! A [`Tracker`] owns the event [`Bus`], an [`ObserverSet`], an
//! [`AliveTracker`] and the registry of live invocations. Tasks created with
//! [`Tracker::task`] publish lifecycle events to its bus and register their
//! invocations, so they can be listed and canceled in bulk.
//!
//! ## Architecture
//! ```text
//! tracker.task(delay, value) ──► DeferredTask (wired: bus, registry, cancel_on_drop)
//!                                    │ subscribe()
//!                                    ▼
//!                               Invocation ── register ──► Registry ◄── cancel_all()
//!                                    │
//!                                    └── publish ──► Bus ──► listener ──► AliveTracker
//!                                                                    └──► ObserverSet
//!
//! Shutdown path:
//!   shutdown()
//!     └─► cancel_all()        → every live invocation publishes InvocationCanceled
//!     └─► stop.cancel()       → listener drains what is queued on the bus
//!     └─► ObserverSet::shutdown() → observer queues drained, workers joined
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use afterthought::{Config, DelaySpec, Tracker, ValueSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), afterthought::DeferError> {
//!     let tracker = Tracker::new(Config::default())?;
//!     let task = tracker.task(DelaySpec::after(Duration::from_secs(60)), ValueSpec::literal(1));
//!
//!     let _sub = task.subscribe_fn(|v| println!("{v}"));
//!     assert_eq!(tracker.live_count(), 1);
//!
//!     tracker.shutdown().await;
//!     assert_eq!(tracker.live_count(), 0);
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::delay::DelaySpec;
use crate::error::DeferError;
use crate::events::{Bus, Event};
use crate::invocation::Wiring;
use crate::observers::ObserverSet;
use crate::protocol::{DeferredTask, Sequence};
use crate::value::ValueSpec;

use super::alive::{AliveTracker, LiveInvocation};
use super::builder::TrackerBuilder;
use super::registry::Registry;

/// Owner of the event wiring shared by the tasks it creates.
pub struct Tracker {
    cfg: Config,
    bus: Bus,
    registry: Arc<Registry>,
    alive: Arc<AliveTracker>,
    stop: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Tracker {
    /// Starts building a tracker.
    pub fn builder(cfg: Config) -> TrackerBuilder {
        TrackerBuilder::new(cfg)
    }

    /// Creates a tracker without observers.
    ///
    /// # Errors
    /// [`DeferError::NoRuntime`] outside of a tokio runtime.
    pub fn new(cfg: Config) -> Result<Arc<Self>, DeferError> {
        TrackerBuilder::new(cfg).build()
    }

    pub(crate) fn start(
        cfg: Config,
        bus: Bus,
        observers: ObserverSet,
        registry: Arc<Registry>,
        alive: Arc<AliveTracker>,
        stop: CancellationToken,
    ) -> Self {
        let listener = tokio::spawn(listen(
            bus.subscribe(),
            observers,
            Arc::clone(&alive),
            Arc::clone(&registry),
            stop.clone(),
        ));
        Self {
            cfg,
            bus,
            registry,
            alive,
            stop,
            listener: Mutex::new(Some(listener)),
        }
    }

    fn wiring(&self) -> Wiring {
        Wiring {
            task: None,
            bus: Some(self.bus.clone()),
            registry: Some(Arc::clone(&self.registry)),
            cancel_on_drop: self.cfg.cancel_on_drop,
        }
    }

    /// Creates a task wired to this tracker.
    pub fn task<T, U>(&self, delay: DelaySpec<U>, value: ValueSpec<T, U>) -> DeferredTask<T, U>
    where
        T: Clone + Send + Sync + 'static,
        U: Clone + Send + Sync + 'static,
    {
        DeferredTask::wired(delay, value, self.wiring())
    }

    /// Creates an empty sequence wired to this tracker.
    pub fn sequence<T: Send + 'static>(&self) -> Sequence<T> {
        Sequence::wired(self.wiring())
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Subscribes to raw lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of live invocations (synchronous, authoritative).
    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    /// Live invocations as seen through events (eventually consistent).
    pub async fn live(&self) -> Vec<LiveInvocation> {
        self.alive.snapshot().await
    }

    /// Cancels every live invocation created by this tracker's tasks.
    ///
    /// Returns how many invocations were canceled.
    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }

    /// Cancels everything, stops the listener and drains observer queues.
    ///
    /// Idempotent; tasks created afterwards still work but nobody listens.
    pub async fn shutdown(&self) {
        self.cancel_all();
        self.stop.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Forwards bus events to the alive view and the observers until stopped.
///
/// When the receiver lags, the alive view is reconciled against the registry.
async fn listen(
    mut rx: broadcast::Receiver<Event>,
    observers: ObserverSet,
    alive: Arc<AliveTracker>,
    registry: Arc<Registry>,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            msg = rx.recv() => match msg {
                Ok(ev) => {
                    alive.update(&ev).await;
                    observers.emit(&ev);
                }
                Err(RecvError::Lagged(_)) => {
                    alive.reconcile(&registry.handles()).await;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    while let Ok(ev) = rx.try_recv() {
        alive.update(&ev).await;
        observers.emit(&ev);
    }
    observers.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::invocation::InvocationState;
    use std::time::Duration;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn live_view_follows_invocations() {
        let tracker = Tracker::new(Config::default()).unwrap();
        let task = tracker
            .task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(1))
            .with_name("tick");
        let sub = task.subscribe_fn(|_| {});
        tokio::task::yield_now().await;

        let live = tracker.live().await;
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, sub.id());
        assert_eq!(live[0].task.as_deref(), Some("tick"));
        assert_eq!(live[0].state, InvocationState::Scheduled);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(tracker.live().await.is_empty());
        assert_eq!(tracker.live_count(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_all_cancels_every_tracked_invocation() {
        let tracker = Tracker::new(Config::default()).unwrap();
        let task = tracker.task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(1));
        let a = task.subscribe_fn(|_| {});
        let b = task.subscribe_fn(|_| {});
        let untracked = DeferredTask::new(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(1));
        let c = untracked.subscribe_fn(|_| {});

        assert_eq!(tracker.live_count(), 2);
        assert_eq!(tracker.cancel_all(), 2);
        assert_eq!(a.state(), InvocationState::Canceled);
        assert_eq!(b.state(), InvocationState::Canceled);
        assert_eq!(c.state(), InvocationState::Scheduled);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn events_are_published_in_transition_order() {
        let tracker = Tracker::new(Config::default()).unwrap();
        let mut rx = tracker.events();
        let task = tracker.task(DelaySpec::immediate(), ValueSpec::literal("x"));
        let sub = task.subscribe_fn(|_| {});

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|ev| ev.invocation == Some(sub.id()))
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::InvocationScheduled,
                EventKind::InvocationFired,
                EventKind::ValueEmitted,
                EventKind::InvocationCompleted,
            ]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cancel_on_drop_config_applies_to_tracked_tasks() {
        let cfg = Config {
            cancel_on_drop: true,
            ..Config::default()
        };
        let tracker = Tracker::new(cfg).unwrap();
        let task = tracker.task(DelaySpec::after(Duration::from_secs(1)), ValueSpec::literal(1));
        drop(task.subscribe_fn(|_| {}));
        assert_eq!(tracker.live_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn shutdown_is_idempotent() {
        let tracker = Tracker::new(Config::default()).unwrap();
        let _sub = tracker
            .task(DelaySpec::after(Duration::from_secs(1)), ValueSpec::literal(1))
            .subscribe_fn(|_| {});
        tracker.shutdown().await;
        tracker.shutdown().await;
        assert_eq!(tracker.live_count(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn live_view_recovers_after_the_bus_lags() {
        let cfg = Config {
            bus_capacity: 4,
            ..Config::default()
        };
        let tracker = Tracker::new(cfg).unwrap();
        let slow = tracker.task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(1));
        let sub = slow.subscribe_fn(|_| {});
        tokio::task::yield_now().await;
        assert_eq!(tracker.live().await.len(), 1);

        sub.unsubscribe();
        let quick = tracker.task(DelaySpec::immediate(), ValueSpec::literal(2));
        for _ in 0..10 {
            let _ = quick.subscribe_fn(|_| {});
        }
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(tracker.live_count(), 0);
        assert!(tracker.live().await.is_empty());
    }

    #[test]
    fn building_outside_runtime_fails() {
        assert!(matches!(
            Tracker::new(Config::default()),
            Err(DeferError::NoRuntime)
        ));
    }
}
