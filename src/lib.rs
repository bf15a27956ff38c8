//! # afterthought
//!
//! **Afterthought** provides one async primitive, the *deferred task*: a value
//! produced after a delay condition is satisfied, that is
//! - **lazy**: nothing happens until it is activated;
//! - **cancelable**: once canceled, nothing is ever delivered;
//! - **dual-protocol**: subscribed to (push) or awaited once (`Future`);
//! - **repeatable**: every activation is an independent invocation.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐        ┌──────────────┐
//!     │  DelaySpec   │        │  ValueSpec   │
//!     │  ("when")    │        │  ("what")    │
//!     └──────┬───────┘        └──────┬───────┘
//!            └───────────┬───────────┘
//!                        ▼
//!               ┌──────────────────┐   subscribe() / await
//!               │   DeferredTask   │◄──────────────────────── caller
//!               │   (template)     │
//!               └────────┬─────────┘
//!                        │ one per activation
//!                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ Invocation (state machine)                                        │
//! │   Idle ─► Scheduled ─► Firing ─► Emitting ─► Completed            │
//! │                 └──────────┴────────┴──────► Errored | Canceled   │
//! │   owns one WaitHandle: armed driver task | relayed subscription   │
//! └──────┬─────────────────────────────────────────────────┬──────────┘
//!        ▼                                                 ▼
//!  Subscriber::on_value / on_complete / on_error     Event ──► Bus (optional)
//!                                                            └─► Tracker ─► observers
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                                |
//! |-------------------|----------------------------------------------------------|------------------------------------------|
//! | **Delays**        | Immediate, duration or externally settled signal         | [`DelaySpec`], [`Signal`], [`Settler`]   |
//! | **Values**        | Literal, thunk, async thunk, relayed source or stream    | [`ValueSpec`]                            |
//! | **Protocols**     | Push subscription and single-resolution await           | [`Subscriber`], [`Subscription`], [`Pending`] |
//! | **Composition**   | Sources run back to back                                 | [`Sequence`], [`concat`]                 |
//! | **Tracking**      | Lifecycle events, live view, bulk cancellation           | [`Tracker`], [`Observe`], [`Event`]      |
//! | **Errors**        | One error channel per invocation                         | [`DeferError`]                           |
//! | **Configuration** | Bus capacity and drop behavior for tracked tasks         | [`Config`]                               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use afterthought::{DelaySpec, Signal, ValueSpec, after, deferred_task};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), afterthought::DeferError> {
//!     // immediate: delivered before subscribe() returns
//!     let now = after(0.0, || "now")?;
//!     let _sub = now.subscribe_fn(|v| assert_eq!(v, "now"));
//!
//!     // duration, awaited once
//!     let later = deferred_task(
//!         DelaySpec::after(Duration::from_millis(10)),
//!         ValueSpec::thunk(|()| 40 + 2),
//!     );
//!     assert_eq!(later.await?, 42);
//!
//!     // signal upstream value feeds the thunk
//!     let doubled = deferred_task(
//!         DelaySpec::signal(Signal::resolved(21)),
//!         ValueSpec::thunk(|n: i32| n * 2),
//!     );
//!     assert_eq!(doubled.await?, 42);
//!     Ok(())
//! }
//! ```

mod config;
mod delay;
mod error;
mod invocation;
mod observers;
mod protocol;
mod tracker;
mod value;

pub mod events;

// ---- Public re-exports ----

pub use config::Config;
pub use delay::{DelayKind, DelaySpec, Settler, Signal};
pub use error::DeferError;
pub use events::{Bus, Event, EventKind};
pub use invocation::InvocationState;
pub use observers::{Observe, ObserverSet};
pub use protocol::{
    DeferredTask, FnSubscriber, Pending, Sequence, Source, StreamFn, Subscriber, Subscription,
    concat,
};
pub use tracker::{AliveTracker, LiveInvocation, Tracker, TrackerBuilder};
pub use value::{AsyncThunkFn, ThunkFn, ValueSpec};

// Optional: expose a simple built-in logger observer (demo/reference).
#[cfg(feature = "logging")]
pub use observers::LogWriter;

/// Pairs a delay with a value into a detached [`DeferredTask`].
///
/// Detached tasks publish no events; use [`Tracker::task`] for tracked ones.
pub fn deferred_task<T, U>(delay: DelaySpec<U>, value: ValueSpec<T, U>) -> DeferredTask<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    DeferredTask::new(delay, value)
}

/// Runs `f` after `ms` milliseconds.
///
/// `ms == 0` fires synchronously (an immediate delay); any other value becomes
/// a duration delay.
///
/// # Errors
/// [`DeferError::Validation`] if `ms` is negative, NaN, infinite or out of range.
///
/// ```rust
/// let task = afterthought::after(0.0, || 7).unwrap();
/// let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
/// let s = seen.clone();
/// let _sub = task.subscribe_fn(move |v| *s.lock().unwrap() = Some(v));
/// assert_eq!(*seen.lock().unwrap(), Some(7));
///
/// assert!(afterthought::after(-5.0, || 7).is_err());
/// ```
pub fn after<T, F>(ms: f64, f: F) -> Result<DeferredTask<T>, DeferError>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let delay = if ms == 0.0 {
        DelaySpec::immediate()
    } else {
        DelaySpec::millis(ms)?
    };
    Ok(DeferredTask::new(delay, ValueSpec::thunk(move |()| f())))
}
