//! # Push-protocol receiver.
//!
//! A [`Subscriber`] receives zero or more `on_value` calls followed by exactly
//! one terminal call (`on_complete` or `on_error`), or nothing at all if its
//! invocation is canceled first.
//!
//! Callbacks run outside of any invocation lock: a subscriber may cancel its
//! own subscription (or subscribe to other tasks) from inside a callback.
//!
//! ## Example
//! ```rust
//! use afterthought::{DeferError, Subscriber};
//!
//! struct Printer;
//!
//! impl Subscriber<u32> for Printer {
//!     fn on_value(&mut self, value: u32) {
//!         println!("got {value}");
//!     }
//!     fn on_error(&mut self, error: DeferError) {
//!         eprintln!("failed: {error}");
//!     }
//! }
//! ```

use std::fmt;

use crate::error::DeferError;

/// Receiver side of the subscribe protocol.
pub trait Subscriber<T>: Send + 'static {
    /// One delivered value.
    fn on_value(&mut self, value: T);

    /// Terminal failure. Called at most once, never after `on_complete`.
    fn on_error(&mut self, error: DeferError) {
        let _ = error;
    }

    /// Terminal success. Called at most once, never after `on_error`.
    fn on_complete(&mut self) {}
}

type ValueFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnOnce(DeferError) + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;

/// [`Subscriber`] assembled from closures; every callback is optional.
///
/// ```rust
/// use afterthought::FnSubscriber;
///
/// let sub = FnSubscriber::new()
///     .on_value(|v: u32| println!("value {v}"))
///     .on_complete(|| println!("done"));
/// # let _ = sub;
/// ```
pub struct FnSubscriber<T> {
    value: Option<ValueFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> FnSubscriber<T> {
    /// A subscriber that ignores everything.
    pub fn new() -> Self {
        Self {
            value: None,
            error: None,
            complete: None,
        }
    }

    /// Sets the value callback.
    pub fn on_value(mut self, f: impl FnMut(T) + Send + 'static) -> Self {
        self.value = Some(Box::new(f));
        self
    }

    /// Sets the error callback.
    pub fn on_error(mut self, f: impl FnOnce(DeferError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the completion callback.
    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl<T> Default for FnSubscriber<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FnSubscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSubscriber")
            .field("on_value", &self.value.is_some())
            .field("on_error", &self.error.is_some())
            .field("on_complete", &self.complete.is_some())
            .finish()
    }
}

impl<T: 'static> Subscriber<T> for FnSubscriber<T> {
    fn on_value(&mut self, value: T) {
        if let Some(f) = self.value.as_mut() {
            f(value);
        }
    }

    fn on_error(&mut self, error: DeferError) {
        if let Some(f) = self.error.take() {
            f(error);
        }
    }

    fn on_complete(&mut self) {
        if let Some(f) = self.complete.take() {
            f();
        }
    }
}
