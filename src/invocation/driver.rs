//! # Driving an invocation from wait to delivery.
//!
//! ```text
//! start(inv, delay, value)
//!   ├─ Wait::Ready(u)    ──► fire(u) synchronously, in the caller
//!   └─ Wait::Pending(w)  ──► spawn_armed(driver):
//!                              select! {
//!                                token.cancelled() ─► exit (WaitHandle released)
//!                                w.await ─► fire(u) ─► eventual value awaited in place
//!                              }
//!
//! fire(u) ──► Resolved::Value    ─► emit + complete | fail
//!         ├─► Resolved::Eventual ─► future (awaited by a driver)
//!         └─► Resolved::Stream   ─► relay(source): inner Subscription becomes the WaitHandle
//! ```
//!
//! A driver that relays hands its `Armed` handle over to the `Relay` handle;
//! the armed guard is retired without canceling so the driver can return.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::delay::{DelaySpec, Wait};
use crate::error::{DeferError, panic_message};
use crate::protocol::{Source, Subscriber};
use crate::value::{Resolved, ValueSpec, resolve};

use super::{Invocation, WaitHandle};

/// Continuation run instead of `complete()` when a relayed source completes.
pub(crate) type Then = Box<dyn FnOnce() + Send>;

/// Starts the delay of a freshly scheduled invocation.
pub(crate) fn start<T, U>(inv: &Arc<Invocation<T>>, delay: &DelaySpec<U>, value: &ValueSpec<T, U>)
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    match delay.begin() {
        Wait::Ready(upstream) => {
            if !inv.fire() {
                return;
            }
            if let Some(eventual) = fire(inv, value, upstream) {
                spawn_armed(inv, eventual);
            }
        }
        Wait::Pending(wait) => {
            let value = value.clone();
            let driven = Arc::clone(inv);
            let driver = async move {
                let upstream = match wait.await {
                    Ok(u) => u,
                    Err(e) => {
                        driven.fail(e);
                        return;
                    }
                };
                if !driven.fire() {
                    return;
                }
                if let Some(eventual) = fire(&driven, &value, upstream) {
                    eventual.await;
                }
            };
            spawn_armed(inv, driver.boxed());
        }
    }
}

/// Runs the value resolver for a firing invocation.
///
/// Returns the remaining work when the value is eventual.
fn fire<T, U>(
    inv: &Arc<Invocation<T>>,
    value: &ValueSpec<T, U>,
    upstream: U,
) -> Option<BoxFuture<'static, ()>>
where
    T: Clone + Send + Sync + 'static,
    U: Send + 'static,
{
    match resolve(value, upstream) {
        Resolved::Value(Ok(v)) => {
            inv.emit(v);
            inv.complete();
            None
        }
        Resolved::Value(Err(e)) => {
            inv.fail(e);
            None
        }
        Resolved::Eventual(fut) => {
            let driven = Arc::clone(inv);
            Some(
                async move {
                    match fut.await {
                        Ok(v) => {
                            driven.emit(v);
                            driven.complete();
                        }
                        Err(e) => driven.fail(e),
                    }
                }
                .boxed(),
            )
        }
        Resolved::Stream(source) => {
            relay(inv, source.as_ref(), None);
            None
        }
    }
}

/// Spawns `work` on the current runtime, owned by the invocation.
///
/// Outside a tokio runtime the invocation errors with [`DeferError::NoRuntime`].
/// A panic escaping `work` errors the invocation with [`DeferError::Resolver`].
pub(crate) fn spawn_armed<T: Send + 'static>(inv: &Arc<Invocation<T>>, work: BoxFuture<'static, ()>) {
    let Ok(rt) = Handle::try_current() else {
        inv.fail(DeferError::NoRuntime);
        return;
    };
    let token = CancellationToken::new();
    inv.arm(WaitHandle::Armed(token.clone().drop_guard()));
    let driven = Arc::clone(inv);
    rt.spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            res = AssertUnwindSafe(work).catch_unwind() => {
                if let Err(payload) = res {
                    driven.fail(DeferError::resolver(panic_message(&*payload)));
                }
            }
        }
    });
}

/// Subscribes the invocation to `source`, forwarding everything verbatim.
///
/// With `then`, the inner completion runs the continuation instead of
/// completing the invocation.
pub(crate) fn relay<T: Send + 'static>(
    inv: &Arc<Invocation<T>>,
    source: &dyn Source<T>,
    then: Option<Then>,
) {
    let forward = Forward {
        inv: Arc::clone(inv),
        then,
    };
    let sub = source.activate(Box::new(forward));
    if !sub.is_closed() {
        inv.arm(WaitHandle::Relay(sub.into_guard()));
    }
}

/// Inner subscriber of a relay.
struct Forward<T> {
    inv: Arc<Invocation<T>>,
    then: Option<Then>,
}

impl<T: Send + 'static> Subscriber<T> for Forward<T> {
    fn on_value(&mut self, value: T) {
        self.inv.emit(value);
    }

    fn on_error(&mut self, error: DeferError) {
        self.inv.fail(error);
    }

    fn on_complete(&mut self) {
        match self.then.take() {
            Some(next) => next(),
            None => self.inv.complete(),
        }
    }
}
