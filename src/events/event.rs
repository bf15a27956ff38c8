//! # Lifecycle events emitted by invocations and observer workers.
//!
//! The [`EventKind`] enum classifies events in two categories:
//! - **Invocation events**: one per state transition of an activation
//!   (scheduled, fired, emitted, completed, errored, canceled)
//! - **Observer events**: problems inside the observer fan-out (overflow, panic)
//!
//! The [`Event`] struct carries metadata such as timestamps, invocation id,
//! task name, delay and error text.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use afterthought::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::InvocationErrored)
//!     .with_invocation(7)
//!     .with_task("greeting")
//!     .with_error("boom")
//!     .with_delay(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::InvocationErrored);
//! assert_eq!(ev.invocation, Some(7));
//! assert_eq!(ev.task.as_deref(), Some("greeting"));
//! assert_eq!(ev.delay_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Invocation lifecycle ===
    /// A subscriber was registered and the delay wait started.
    ///
    /// Sets:
    /// - `invocation`: invocation id
    /// - `task`: task name (if named)
    /// - `delay_kind`: `immediate`, `duration`, `signal`, `sequence` or `stream`
    /// - `delay_ms`: requested duration (only for `duration`)
    InvocationScheduled,

    /// The delay elapsed and the value resolver is running.
    ///
    /// Sets:
    /// - `invocation`: invocation id
    /// - `task`: task name (if named)
    InvocationFired,

    /// A value was handed to the subscriber.
    ///
    /// Sets:
    /// - `invocation`: invocation id
    /// - `task`: task name (if named)
    ValueEmitted,

    /// The invocation delivered its terminal `complete` notification.
    ///
    /// Sets:
    /// - `invocation`: invocation id
    /// - `task`: task name (if named)
    InvocationCompleted,

    /// The invocation delivered its terminal error notification.
    ///
    /// Sets:
    /// - `invocation`: invocation id
    /// - `task`: task name (if named)
    /// - `error`: error message
    InvocationErrored,

    /// The invocation was canceled before reaching another terminal state.
    ///
    /// Sets:
    /// - `invocation`: invocation id
    /// - `task`: task name (if named)
    InvocationCanceled,

    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `task`: observer name
    /// - `error`: panic info/message
    ObserverPanicked,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: observer name
    /// - `error`: reason string (e.g., "full", "closed")
    ObserverOverflow,
}

impl EventKind {
    /// True for the three terminal invocation events.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventKind::InvocationCompleted
                | EventKind::InvocationErrored
                | EventKind::InvocationCanceled
        )
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Id of the invocation the event belongs to.
    pub invocation: Option<u64>,
    /// Name of the task (or observer), if applicable.
    pub task: Option<Arc<str>>,
    /// Kind of delay the invocation waits on.
    pub delay_kind: Option<&'static str>,
    /// Requested delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Error message or overflow/panic details.
    pub error: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            invocation: None,
            task: None,
            delay_kind: None,
            delay_ms: None,
            error: None,
        }
    }

    /// Attaches an invocation id.
    #[inline]
    pub fn with_invocation(mut self, id: u64) -> Self {
        self.invocation = Some(id);
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an optional task name.
    #[inline]
    pub fn with_task_opt(mut self, task: Option<&Arc<str>>) -> Self {
        self.task = task.cloned();
        self
    }

    /// Attaches the delay kind label.
    #[inline]
    pub fn with_delay_kind(mut self, kind: &'static str) -> Self {
        self.delay_kind = Some(kind);
        self
    }

    /// Attaches a delay duration (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_task(observer)
            .with_error(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_task(observer)
            .with_error(info)
    }
}
