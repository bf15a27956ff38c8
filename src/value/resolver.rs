//! # Value resolution at fire time.
//!
//! `resolve(spec, upstream)` is called exactly once per activation, when the
//! invocation enters `Firing`. Panics raised by thunks (while called or while
//! their future is polled) are caught and turned into `DeferError::Resolver`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::error::{DeferError, panic_message};
use crate::protocol::Source;

use super::ValueSpec;

/// Fire-time outcome of a [`ValueSpec`].
pub(crate) enum Resolved<T> {
    /// Known synchronously.
    Value(Result<T, DeferError>),
    /// Must be awaited by the invocation's driver.
    Eventual(BoxFuture<'static, Result<T, DeferError>>),
    /// Must be relayed.
    Stream(Arc<dyn Source<T>>),
}

pub(crate) fn resolve<T, U>(spec: &ValueSpec<T, U>, upstream: U) -> Resolved<T>
where
    T: Clone + Send + 'static,
{
    match spec {
        ValueSpec::Literal(v) => Resolved::Value(Ok(v.clone())),
        ValueSpec::Thunk(f) => Resolved::Value(
            catch_unwind(AssertUnwindSafe(|| f(upstream)))
                .unwrap_or_else(|p| Err(DeferError::resolver(panic_message(&*p)))),
        ),
        ValueSpec::AsyncThunk(f) => match catch_unwind(AssertUnwindSafe(|| f(upstream))) {
            Ok(fut) => Resolved::Eventual(
                AssertUnwindSafe(fut)
                    .catch_unwind()
                    .map(|r| r.unwrap_or_else(|p| Err(DeferError::resolver(panic_message(&*p)))))
                    .boxed(),
            ),
            Err(p) => Resolved::Value(Err(DeferError::resolver(panic_message(&*p)))),
        },
        ValueSpec::InnerStream(s) => Resolved::Stream(Arc::clone(s)),
    }
}
