//! # Value specification ("what" a task produces).
//!
//! [`ValueSpec`] is a tagged union chosen by the constructor the caller uses;
//! nothing inspects the shape of a value at runtime.
//!
//! | Constructor                       | Variant       | Fire-time behavior                       |
//! |-----------------------------------|---------------|------------------------------------------|
//! | [`literal`](ValueSpec::literal)   | `Literal`     | clone of the value                       |
//! | [`thunk`](ValueSpec::thunk)       | `Thunk`       | `f(upstream)`, once per activation       |
//! | [`try_thunk`](ValueSpec::try_thunk) | `Thunk`     | `Err` becomes `DeferError::Resolver`     |
//! | [`future`](ValueSpec::future)     | `AsyncThunk`  | `f(upstream).await` inside the driver    |
//! | [`try_future`](ValueSpec::try_future) | `AsyncThunk` | same, fallible                        |
//! | [`relay`](ValueSpec::relay)       | `InnerStream` | subscribe to the source, forward all     |
//! | [`stream`](ValueSpec::stream)     | `InnerStream` | relay a fresh `futures::Stream`          |
//!
//! Thunks are never called at construction time.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::Stream;
use futures::future::{BoxFuture, FutureExt};

use crate::error::DeferError;
use crate::protocol::{Source, StreamFn};

/// Synchronous value thunk.
pub type ThunkFn<T, U> = Arc<dyn Fn(U) -> Result<T, DeferError> + Send + Sync>;

/// Asynchronous value thunk.
pub type AsyncThunkFn<T, U> =
    Arc<dyn Fn(U) -> BoxFuture<'static, Result<T, DeferError>> + Send + Sync>;

/// What a deferred task produces once its delay is satisfied.
///
/// `U` is the upstream value handed over by the delay (unit unless the delay
/// is a signal).
pub enum ValueSpec<T, U = ()> {
    /// A fixed value, cloned per activation.
    Literal(T),
    /// Called at fire time with the upstream value.
    Thunk(ThunkFn<T, U>),
    /// Called at fire time; its future is awaited by the invocation's driver.
    AsyncThunk(AsyncThunkFn<T, U>),
    /// Subscribed at fire time; every value and the terminal are relayed.
    InnerStream(Arc<dyn Source<T>>),
}

impl<T: 'static, U> ValueSpec<T, U> {
    /// A fixed value.
    pub fn literal(value: T) -> Self {
        ValueSpec::Literal(value)
    }

    /// A thunk receiving the upstream value.
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn(U) -> T + Send + Sync + 'static,
    {
        ValueSpec::Thunk(Arc::new(move |u| Ok(f(u))))
    }

    /// A fallible thunk; its error becomes [`DeferError::Resolver`].
    pub fn try_thunk<F, E>(f: F) -> Self
    where
        F: Fn(U) -> Result<T, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        ValueSpec::Thunk(Arc::new(move |u| f(u).map_err(DeferError::resolver)))
    }

    /// An async thunk receiving the upstream value.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        ValueSpec::AsyncThunk(Arc::new(move |u| f(u).map(Ok).boxed()))
    }

    /// A fallible async thunk; its error becomes [`DeferError::Resolver`].
    pub fn try_future<F, Fut, E>(f: F) -> Self
    where
        F: Fn(U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display,
    {
        ValueSpec::AsyncThunk(Arc::new(move |u| {
            f(u).map(|r| r.map_err(DeferError::resolver)).boxed()
        }))
    }

    /// Relays another source once the task fires.
    pub fn relay<S>(source: S) -> Self
    where
        S: Source<T>,
    {
        ValueSpec::InnerStream(Arc::new(source))
    }

    /// Relays a stream built by `factory`, called once per activation at fire time.
    ///
    /// `Err` items become [`DeferError::Relayed`] and end the relay.
    pub fn stream<F, St, E>(factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> St + Send + Sync + 'static,
        St: Stream<Item = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        ValueSpec::relay(StreamFn::new(factory))
    }

    /// Short variant name.
    pub fn as_label(&self) -> &'static str {
        match self {
            ValueSpec::Literal(_) => "literal",
            ValueSpec::Thunk(_) => "thunk",
            ValueSpec::AsyncThunk(_) => "async_thunk",
            ValueSpec::InnerStream(_) => "inner_stream",
        }
    }
}

impl<T: Clone, U> Clone for ValueSpec<T, U> {
    fn clone(&self) -> Self {
        match self {
            ValueSpec::Literal(v) => ValueSpec::Literal(v.clone()),
            ValueSpec::Thunk(f) => ValueSpec::Thunk(Arc::clone(f)),
            ValueSpec::AsyncThunk(f) => ValueSpec::AsyncThunk(Arc::clone(f)),
            ValueSpec::InnerStream(s) => ValueSpec::InnerStream(Arc::clone(s)),
        }
    }
}

impl<T: fmt::Debug, U> fmt::Debug for ValueSpec<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSpec::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            other => f.write_str(match other {
                ValueSpec::Thunk(_) => "Thunk(..)",
                ValueSpec::AsyncThunk(_) => "AsyncThunk(..)",
                _ => "InnerStream(..)",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn constructors_pick_the_variant() {
        assert_eq!(ValueSpec::<u8>::literal(1).as_label(), "literal");
        assert_eq!(ValueSpec::<u8>::thunk(|()| 1).as_label(), "thunk");
        assert_eq!(
            ValueSpec::<u8>::try_thunk(|()| Err::<u8, _>("no")).as_label(),
            "thunk"
        );
        assert_eq!(
            ValueSpec::<u8>::future(|()| async { 1 }).as_label(),
            "async_thunk"
        );
        assert_eq!(
            ValueSpec::<u8>::try_future(|()| async { Err::<u8, _>("late") }).as_label(),
            "async_thunk"
        );
        assert_eq!(
            ValueSpec::<u8>::stream(|| futures::stream::iter([Ok::<u8, String>(1)])).as_label(),
            "inner_stream"
        );
    }

    #[test]
    fn thunks_are_not_called_at_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let spec = ValueSpec::<usize>::thunk(move |()| c.fetch_add(1, Ordering::SeqCst));
        let _copy = spec.clone();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn debug_hides_closures() {
        assert_eq!(format!("{:?}", ValueSpec::<u8>::literal(3)), "Literal(3)");
        assert_eq!(format!("{:?}", ValueSpec::<u8>::thunk(|()| 3)), "Thunk(..)");
    }
}
