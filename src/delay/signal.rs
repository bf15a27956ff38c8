//! # Externally settled single-value sources.
//!
//! A [`Signal`] is the "pending signal" a task can wait on instead of a timer.
//! It settles once, with a value or an error, and every clone observes the same
//! settlement. That makes it safe to use as the delay of a task that is
//! activated many times: each activation awaits the same outcome.
//!
//! ```rust
//! use afterthought::Signal;
//!
//! let (settler, signal) = Signal::<u32>::channel();
//! assert!(!signal.is_settled());
//! settler.resolve(7);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::error::DeferError;

type Settled<U> = Result<U, Arc<str>>;

/// Cloneable single-value source settled from outside the task.
pub struct Signal<U> {
    inner: Shared<BoxFuture<'static, Settled<U>>>,
}

impl<U> Clone for Signal<U>
where
    U: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<U> fmt::Debug for Signal<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").finish_non_exhaustive()
    }
}

impl<U> Signal<U>
where
    U: Clone + Send + Sync + 'static,
{
    /// Wraps a future; its output settles the signal.
    ///
    /// The future is not polled until some activation waits on the signal.
    pub fn from_future<F, E>(fut: F) -> Self
    where
        F: Future<Output = Result<U, E>> + Send + 'static,
        E: fmt::Display,
    {
        let inner = async move { fut.await.map_err(|e| Arc::<str>::from(e.to_string())) }
            .boxed()
            .shared();
        Self { inner }
    }

    /// A signal that has already settled with `value`.
    pub fn resolved(value: U) -> Self {
        Self {
            inner: future::ready(Ok(value)).boxed().shared(),
        }
    }

    /// A signal that has already settled with an error.
    pub fn rejected(error: impl fmt::Display) -> Self {
        let error: Arc<str> = error.to_string().into();
        Self {
            inner: future::ready(Err(error)).boxed().shared(),
        }
    }

    /// Creates an unsettled signal together with the [`Settler`] that settles it.
    ///
    /// Dropping the settler without calling it rejects the signal.
    pub fn channel() -> (Settler<U>, Self) {
        let (tx, rx) = oneshot::channel::<Settled<U>>();
        let inner = async move {
            match rx.await {
                Ok(settled) => settled,
                Err(_) => Err(Arc::from("signal dropped without settling")),
            }
        }
        .boxed()
        .shared();
        (Settler { tx }, Self { inner })
    }

    /// True once some waiter has observed the settlement.
    pub fn is_settled(&self) -> bool {
        self.inner.peek().is_some()
    }

    /// Returns the settlement if a waiter already observed it.
    pub fn peek(&self) -> Option<Result<U, DeferError>> {
        self.inner.peek().cloned().map(|r| r.map_err(upstream))
    }

    /// Waits for the settlement; errors map to [`DeferError::Upstream`].
    pub(crate) fn wait(&self) -> impl Future<Output = Result<U, DeferError>> + Send + use<U> {
        self.inner.clone().map(|r| r.map_err(upstream))
    }
}

fn upstream(error: Arc<str>) -> DeferError {
    DeferError::Upstream {
        error: error.to_string(),
    }
}

/// Write side of a [`Signal::channel`].
#[derive(Debug)]
pub struct Settler<U> {
    tx: oneshot::Sender<Settled<U>>,
}

impl<U> Settler<U> {
    /// Settles the signal with a value.
    ///
    /// Returns `false` if every clone of the signal is already gone.
    pub fn resolve(self, value: U) -> bool {
        self.tx.send(Ok(value)).is_ok()
    }

    /// Settles the signal with an error.
    pub fn reject(self, error: impl fmt::Display) -> bool {
        self.tx.send(Err(error.to_string().into())).is_ok()
    }
}
