//! # Per-activation handle.
//!
//! A [`Subscription`] is returned by every activation. It controls exactly one
//! invocation: `unsubscribe()` cancels it (idempotently), `state()` and
//! `is_closed()` observe it.
//!
//! Dropping a subscription does **not** cancel the invocation unless it was
//! created with `cancel_on_drop` (see [`Config`](crate::Config)) or turned into
//! a guard with [`Subscription::into_guard`].

use std::fmt;
use std::sync::Arc;

use crate::invocation::{InvocationState, Lifecycle};

/// Handle to one activation of a source.
#[must_use = "dropping a subscription leaves its invocation running; call `unsubscribe` to cancel"]
pub struct Subscription {
    handle: Arc<dyn Lifecycle>,
    cancel_on_drop: bool,
}

impl Subscription {
    pub(crate) fn new(handle: Arc<dyn Lifecycle>, cancel_on_drop: bool) -> Self {
        Self {
            handle,
            cancel_on_drop,
        }
    }

    /// Cancels the invocation.
    ///
    /// Returns `false` if it already reached a terminal state. After this
    /// returns `true`, no value or terminal notification is ever delivered.
    pub fn unsubscribe(&self) -> bool {
        self.handle.cancel()
    }

    /// True once the invocation reached a terminal state.
    pub fn is_closed(&self) -> bool {
        self.handle.state().is_terminal()
    }

    /// Current invocation state.
    pub fn state(&self) -> InvocationState {
        self.handle.state()
    }

    /// Global invocation id (matches `Event::invocation`).
    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// Makes dropping this subscription cancel its invocation.
    pub fn into_guard(mut self) -> Self {
        self.cancel_on_drop = true;
        self
    }

    /// True if dropping this subscription cancels the invocation.
    pub fn cancels_on_drop(&self) -> bool {
        self.cancel_on_drop
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.cancel_on_drop {
            self.handle.cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.handle.id())
            .field("state", &self.handle.state())
            .field("cancel_on_drop", &self.cancel_on_drop)
            .finish()
    }
}
