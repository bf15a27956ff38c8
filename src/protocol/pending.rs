//! # Await protocol.
//!
//! [`Pending`] is the single-resolution view of a source. It is lazy: the
//! source is activated on the first poll, never before.
//!
//! ```text
//! poll #1 ──► activate(source, First{tx})  (guard subscription)
//!               ├─ on_value(v)   ─► Ok(v), subscription released
//!               ├─ on_error(e)   ─► Err(e)
//!               ├─ on_complete() ─► Err(Empty)
//!               └─ canceled      ─► subscriber dropped, tx closed ─► Err(Canceled)
//! ```
//!
//! `cancel()` (or the token from `cancel_handle()`) cancels the underlying
//! invocation; the future then resolves with `Err(DeferError::Canceled)`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::DeferError;

use super::{Source, Subscriber};

/// Future resolving with the first value of one activation.
#[must_use = "futures do nothing unless polled"]
pub struct Pending<T> {
    fut: BoxFuture<'static, Result<T, DeferError>>,
    token: CancellationToken,
}

impl<T: Send + 'static> Pending<T> {
    pub(crate) fn from_source<S: Source<T>>(source: S) -> Self {
        let token = CancellationToken::new();
        let stop = token.clone();
        let fut = async move {
            if stop.is_cancelled() {
                return Err(DeferError::Canceled);
            }
            let (tx, rx) = oneshot::channel();
            let sub = source.activate(Box::new(First { tx: Some(tx) })).into_guard();
            let out = tokio::select! {
                biased;
                res = rx => res.unwrap_or(Err(DeferError::Canceled)),
                _ = stop.cancelled() => Err(DeferError::Canceled),
            };
            drop(sub);
            out
        };
        Self {
            fut: fut.boxed(),
            token,
        }
    }

    /// Cancels the underlying invocation (or prevents it from starting).
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that cancels this await when triggered.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, DeferError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.fut.poll_unpin(cx)
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("canceled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Subscriber settling the await with the first notification.
struct First<T> {
    tx: Option<oneshot::Sender<Result<T, DeferError>>>,
}

impl<T> First<T> {
    fn settle(&mut self, out: Result<T, DeferError>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(out);
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for First<T> {
    fn on_value(&mut self, value: T) {
        self.settle(Ok(value));
    }

    fn on_error(&mut self, error: DeferError) {
        self.settle(Err(error));
    }

    fn on_complete(&mut self) {
        self.settle(Err(DeferError::Empty));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DelaySpec, DeferredTask, ValueSpec};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "current_thread")]
    async fn lazy_until_polled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let task = DeferredTask::new(
            DelaySpec::immediate(),
            ValueSpec::thunk(move |()| c.fetch_add(1, Ordering::SeqCst)),
        );
        let pending = task.await_once();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(pending.await, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_resolves_with_canceled() {
        let task = DeferredTask::new(
            DelaySpec::after(Duration::from_millis(10)),
            ValueSpec::literal(1),
        );
        let pending = task.await_once();
        let handle = pending.cancel_handle();
        let waiter = tokio::spawn(pending);
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.cancel();
        assert_eq!(waiter.await.unwrap(), Err(DeferError::Canceled));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cancel_before_poll_never_activates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let task = DeferredTask::new(
            DelaySpec::immediate(),
            ValueSpec::thunk(move |()| c.fetch_add(1, Ordering::SeqCst)),
        );
        let pending = task.await_once();
        pending.cancel();
        assert_eq!(pending.await, Err(DeferError::Canceled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_source_rejects_with_empty() {
        let empty = DeferredTask::<u8>::new(
            DelaySpec::immediate(),
            ValueSpec::stream(|| futures::stream::empty::<Result<u8, String>>()),
        );
        assert_eq!(empty.await, Err(DeferError::Empty));
    }
}
