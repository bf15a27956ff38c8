//! # Owned wait resource of an invocation.
//!
//! An invocation owns at most one [`WaitHandle`] at a time:
//! - `Armed`: the driver task waiting on a timer, a signal or an async thunk.
//!   Dropping the guard cancels the driver's token.
//! - `Relay`: the subscription to an inner source. It is a guard subscription,
//!   so dropping it unsubscribes the inner source.
//!
//! Release is `Drop`. The invocation keeps the handle in an `Option` that is
//! `take()`n exactly once on the terminal transition.

use tokio_util::sync::DropGuard;

use crate::protocol::Subscription;

/// The single live wait resource of an invocation.
#[derive(Debug)]
pub(crate) enum WaitHandle {
    /// Driver task; the guard cancels it when released.
    Armed(DropGuard),
    /// Inner source subscription (cancel-on-drop).
    Relay(Subscription),
}

impl WaitHandle {
    /// Hands over to the next wait without canceling work that already finished.
    ///
    /// An armed driver that is being replaced is the one doing the replacing,
    /// so its guard is disarmed instead of canceled. A replaced relay has
    /// completed, dropping it is a no-op unsubscribe.
    pub(crate) fn retire(self) {
        match self {
            WaitHandle::Armed(guard) => {
                let _ = guard.disarm();
            }
            WaitHandle::Relay(sub) => drop(sub),
        }
    }
}
