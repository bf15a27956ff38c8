//! Error types used by deferred tasks and their invocations.
//!
//! [`DeferError`] is the single error channel of an invocation. Every failure,
//! whether raised while validating a delay, running a value thunk, waiting on an
//! upstream signal or relaying an inner stream, surfaces through it, both in
//! [`Subscriber::on_error`](crate::Subscriber::on_error) and in the rejection
//! of a [`Pending`](crate::Pending) future.
//!
//! Like the rest of the runtime errors it provides helper methods
//! (`as_label`, `as_message`) for logs and events.

use std::any::Any;

use thiserror::Error;

/// # Errors produced by deferred tasks.
///
/// Construction-time failures ([`DeferError::Validation`]) are returned directly
/// to the caller. All others are delivered through the invocation's error path
/// and are terminal: the invocation moves to `Errored` and releases its wait.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeferError {
    /// The delay is malformed (negative, NaN or infinite duration).
    #[error("invalid delay: {reason}")]
    Validation {
        /// Why the delay was rejected.
        reason: String,
    },

    /// A value thunk (sync or async) panicked or returned an error.
    #[error("value resolver failed: {error}")]
    Resolver {
        /// The underlying error message.
        error: String,
    },

    /// The pending signal used as a delay settled with an error.
    #[error("upstream signal failed: {error}")]
    Upstream {
        /// The underlying error message.
        error: String,
    },

    /// An inner stream relayed by the task yielded an error item.
    #[error("relayed stream failed: {error}")]
    Relayed {
        /// The underlying error message.
        error: String,
    },

    /// The invocation backing an await was canceled before it settled.
    #[error("invocation canceled")]
    Canceled,

    /// The source completed without delivering any value to an await.
    #[error("completed without a value")]
    Empty,

    /// An asynchronous wait was requested outside of a tokio runtime.
    #[error("no tokio runtime available to drive the wait")]
    NoRuntime,
}

impl DeferError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use afterthought::DeferError;
    ///
    /// let err = DeferError::Upstream { error: "boom".into() };
    /// assert_eq!(err.as_label(), "defer_upstream");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeferError::Validation { .. } => "defer_validation",
            DeferError::Resolver { .. } => "defer_resolver",
            DeferError::Upstream { .. } => "defer_upstream",
            DeferError::Relayed { .. } => "defer_relayed",
            DeferError::Canceled => "defer_canceled",
            DeferError::Empty => "defer_empty",
            DeferError::NoRuntime => "defer_no_runtime",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DeferError::Validation { reason } => format!("validation: {reason}"),
            DeferError::Resolver { error } => format!("resolver: {error}"),
            DeferError::Upstream { error } => format!("upstream: {error}"),
            DeferError::Relayed { error } => format!("relayed: {error}"),
            DeferError::Canceled => "invocation canceled".to_string(),
            DeferError::Empty => "completed without a value".to_string(),
            DeferError::NoRuntime => "no tokio runtime".to_string(),
        }
    }

    /// True for [`DeferError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, DeferError::Canceled)
    }

    pub(crate) fn resolver(error: impl ToString) -> Self {
        DeferError::Resolver {
            error: error.to_string(),
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
