//! # Invocation states.
//!
//! ```text
//! Idle ──► Scheduled ──► Firing ──► Emitting ──► Completed
//!   │          │           │           │    ▲
//!   │          │           │           └────┘ (relays emit repeatedly)
//!   └──────────┴───────────┴───────────┴──► Canceled | Errored
//! ```
//!
//! `Completed`, `Errored` and `Canceled` are terminal.

/// Lifecycle state of one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationState {
    /// Created, no subscriber registered yet.
    Idle,
    /// Subscriber registered; the delay wait is active.
    Scheduled,
    /// Delay satisfied; the value resolver is running.
    Firing,
    /// Forwarding value(s) to the subscriber.
    Emitting,
    /// Terminal: `on_complete` delivered.
    Completed,
    /// Terminal: `on_error` delivered.
    Errored,
    /// Terminal: canceled, nothing further is delivered.
    Canceled,
}

impl InvocationState {
    /// True for `Completed`, `Errored` and `Canceled`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvocationState::Completed | InvocationState::Errored | InvocationState::Canceled
        )
    }

    /// True while values may still be delivered.
    #[inline]
    pub(crate) fn accepts_values(self) -> bool {
        matches!(self, InvocationState::Firing | InvocationState::Emitting)
    }

    /// Returns a short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            InvocationState::Idle => "idle",
            InvocationState::Scheduled => "scheduled",
            InvocationState::Firing => "firing",
            InvocationState::Emitting => "emitting",
            InvocationState::Completed => "completed",
            InvocationState::Errored => "errored",
            InvocationState::Canceled => "canceled",
        }
    }
}
