//! # Delay specification ("when" a task fires).
//!
//! [`DelaySpec`] is one of three kinds:
//! - **Immediate**: fire synchronously inside the activation call;
//! - **Duration**: fire after a timer elapses (zero is still asynchronous);
//! - **PendingSignal**: fire when a [`Signal`] settles; its value feeds the
//!   value resolver.
//!
//! Immediate and duration delays carry the unit upstream value, so they pair
//! with value specs written against `()`. Only signal delays produce a typed
//! upstream value.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use afterthought::{DelayKind, DelaySpec, Signal};
//!
//! assert_eq!(DelaySpec::immediate().kind(), DelayKind::Immediate);
//! assert_eq!(
//!     DelaySpec::millis(250.0).unwrap().kind(),
//!     DelayKind::Duration(Duration::from_millis(250))
//! );
//! assert!(DelaySpec::millis(-1.0).is_err());
//! assert_eq!(DelaySpec::signal(Signal::resolved(1)).kind(), DelayKind::PendingSignal);
//! ```

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::time::Instant;

use crate::delay::signal::Signal;
use crate::error::DeferError;

/// Public view of which variant a [`DelaySpec`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    /// Fires synchronously within the activation call.
    Immediate,
    /// Fires after the given duration.
    Duration(Duration),
    /// Fires when a signal settles.
    PendingSignal,
}

impl DelayKind {
    /// Returns a short stable label for events.
    pub fn as_label(&self) -> &'static str {
        match self {
            DelayKind::Immediate => "immediate",
            DelayKind::Duration(_) => "duration",
            DelayKind::PendingSignal => "signal",
        }
    }
}

/// When a deferred task fires, with the upstream value type `U` it produces.
#[derive(Debug)]
pub struct DelaySpec<U = ()> {
    repr: Repr<U>,
}

#[derive(Debug)]
enum Repr<U> {
    Immediate(U),
    Timer(Duration, U),
    Signal(Signal<U>),
}

impl<U: Clone> Clone for DelaySpec<U> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Immediate(u) => Repr::Immediate(u.clone()),
            Repr::Timer(d, u) => Repr::Timer(*d, u.clone()),
            Repr::Signal(s) => Repr::Signal(s.clone()),
        };
        Self { repr }
    }
}

impl DelaySpec<()> {
    /// Fire synchronously, before the activation call returns.
    pub fn immediate() -> Self {
        Self {
            repr: Repr::Immediate(()),
        }
    }

    /// Fire once `duration` has elapsed.
    ///
    /// `Duration::ZERO` still fires asynchronously.
    pub fn after(duration: Duration) -> Self {
        Self {
            repr: Repr::Timer(duration, ()),
        }
    }

    /// Fire after a numeric number of milliseconds.
    ///
    /// # Errors
    /// [`DeferError::Validation`] if `ms` is NaN, infinite, negative or too large
    /// to represent as a [`Duration`].
    pub fn millis(ms: f64) -> Result<Self, DeferError> {
        if !ms.is_finite() {
            return Err(DeferError::Validation {
                reason: format!("duration must be finite, got {ms}"),
            });
        }
        if ms < 0.0 {
            return Err(DeferError::Validation {
                reason: format!("duration must be non-negative, got {ms}"),
            });
        }
        Duration::try_from_secs_f64(ms / 1000.0)
            .map(Self::after)
            .map_err(|e| DeferError::Validation {
                reason: format!("duration {ms}ms out of range: {e}"),
            })
    }
}

impl<U> DelaySpec<U> {
    /// Fire when `signal` settles; its value is handed to the value resolver.
    pub fn signal(signal: Signal<U>) -> Self {
        Self {
            repr: Repr::Signal(signal),
        }
    }

    /// Which variant this delay is.
    pub fn kind(&self) -> DelayKind {
        match &self.repr {
            Repr::Immediate(_) => DelayKind::Immediate,
            Repr::Timer(d, _) => DelayKind::Duration(*d),
            Repr::Signal(_) => DelayKind::PendingSignal,
        }
    }

    /// True for [`DelaySpec::immediate`].
    pub fn is_immediate(&self) -> bool {
        matches!(self.repr, Repr::Immediate(_))
    }
}

impl From<Duration> for DelaySpec<()> {
    fn from(duration: Duration) -> Self {
        DelaySpec::after(duration)
    }
}

impl<U> From<Signal<U>> for DelaySpec<U> {
    fn from(signal: Signal<U>) -> Self {
        DelaySpec::signal(signal)
    }
}

/// Outcome of starting a delay.
pub(crate) enum Wait<U> {
    /// The delay is already satisfied; fire synchronously.
    Ready(U),
    /// The delay must be awaited by an armed driver.
    Pending(BoxFuture<'static, Result<U, DeferError>>),
}

impl<U> DelaySpec<U>
where
    U: Clone + Send + Sync + 'static,
{
    /// Starts the wait for one activation.
    ///
    /// A timer's deadline is fixed here, at activation, so time spent before
    /// the driver is first polled counts toward the delay. Signals are only
    /// awaited once the driver runs.
    pub(crate) fn begin(&self) -> Wait<U> {
        match &self.repr {
            Repr::Immediate(u) => Wait::Ready(u.clone()),
            Repr::Timer(duration, u) => {
                let deadline = deadline_after(*duration);
                let u = u.clone();
                Wait::Pending(
                    async move {
                        tokio::time::sleep_until(deadline).await;
                        Ok(u)
                    }
                    .boxed(),
                )
            }
            Repr::Signal(signal) => Wait::Pending(signal.wait().boxed()),
        }
    }
}

/// Deadline `duration` from now, saturating at roughly thirty years.
fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_rejects_invalid_input() {
        for bad in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = DelaySpec::millis(bad).unwrap_err();
            assert_eq!(err.as_label(), "defer_validation");
        }
    }

    #[test]
    fn millis_accepts_zero_and_whole_values() {
        assert_eq!(
            DelaySpec::millis(0.0).unwrap().kind(),
            DelayKind::Duration(Duration::ZERO)
        );
        assert_eq!(
            DelaySpec::millis(1500.0).unwrap().kind(),
            DelayKind::Duration(Duration::from_millis(1500))
        );
    }

    #[test]
    fn millis_rejects_overflow() {
        assert!(DelaySpec::millis(f64::MAX).is_err());
    }

    #[test]
    fn immediate_is_ready_synchronously() {
        assert!(matches!(DelaySpec::immediate().begin(), Wait::Ready(())));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn timer_waits_for_duration() {
        let delay = DelaySpec::after(Duration::from_millis(30));
        let Wait::Pending(wait) = delay.begin() else {
            panic!("timer must be pending");
        };
        let started = tokio::time::Instant::now();
        wait.await.expect("timer");
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn timer_deadline_is_fixed_when_the_wait_begins() {
        let delay = DelaySpec::after(Duration::from_millis(10));
        let started = tokio::time::Instant::now();
        let Wait::Pending(wait) = delay.begin() else {
            panic!("timer must be pending");
        };
        tokio::time::advance(Duration::from_millis(15)).await;
        wait.await.expect("timer");
        assert_eq!(started.elapsed(), Duration::from_millis(15));
    }

    #[test]
    fn huge_durations_do_not_overflow_the_deadline() {
        let delay = DelaySpec::after(Duration::MAX);
        assert!(matches!(delay.begin(), Wait::Pending(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn signal_passes_value_through() {
        let delay = DelaySpec::signal(Signal::resolved(1.25));
        let Wait::Pending(wait) = delay.begin() else {
            panic!("signal must be pending");
        };
        assert_eq!(wait.await, Ok(1.25));
    }
}
