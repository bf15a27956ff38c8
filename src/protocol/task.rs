//! # The deferred task.
//!
//! [`DeferredTask`] pairs a [`DelaySpec`] with a [`ValueSpec`]. It owns no
//! running resource: it is a template, cheap to clone and activatable any
//! number of times, concurrently.
//!
//! It speaks both protocols statically:
//! - **subscribe**: [`DeferredTask::subscribe`] / [`Source::activate`], one
//!   fresh invocation per call;
//! - **await**: [`DeferredTask::await_once`] and `IntoFuture`, resolving with
//!   the first value.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use afterthought::{DelaySpec, ValueSpec, deferred_task};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let task = deferred_task(
//!         DelaySpec::after(Duration::from_millis(5)),
//!         ValueSpec::thunk(|()| "ready"),
//!     );
//!     assert_eq!(task.clone().await, Ok("ready"));
//!     assert_eq!((&task).await, Ok("ready"));
//! }
//! ```

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use crate::delay::{DelayKind, DelaySpec};
use crate::invocation::{Invocation, Wiring, driver};
use crate::value::ValueSpec;

use super::{FnSubscriber, Pending, Sequence, Source, Subscriber, Subscription};

/// A lazy, cancelable, repeatable deferred value.
pub struct DeferredTask<T, U = ()> {
    inner: Arc<TaskInner<T, U>>,
}

struct TaskInner<T, U> {
    delay: DelaySpec<U>,
    value: ValueSpec<T, U>,
    wiring: Wiring,
}

impl<T: Clone, U: Clone> Clone for TaskInner<T, U> {
    fn clone(&self) -> Self {
        Self {
            delay: self.delay.clone(),
            value: self.value.clone(),
            wiring: self.wiring.clone(),
        }
    }
}

impl<T, U> Clone for DeferredTask<T, U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, U> DeferredTask<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    /// Pairs a delay with a value. Nothing runs until activation.
    pub fn new(delay: DelaySpec<U>, value: ValueSpec<T, U>) -> Self {
        Self::wired(delay, value, Wiring::default())
    }

    pub(crate) fn wired(delay: DelaySpec<U>, value: ValueSpec<T, U>, wiring: Wiring) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                delay,
                value,
                wiring,
            }),
        }
    }

    /// Returns a copy of this task whose events carry `name`.
    pub fn with_name(self, name: impl Into<Arc<str>>) -> Self {
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.wiring = inner.wiring.named(name);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Task name, if any.
    pub fn name(&self) -> Option<&str> {
        self.inner.wiring.task.as_deref()
    }

    /// Which delay this task waits for.
    pub fn delay_kind(&self) -> DelayKind {
        self.inner.delay.kind()
    }

    /// Activates the task; one fresh invocation per call.
    ///
    /// With an immediate delay and a synchronous value, `subscriber` has already
    /// received the value and the completion when this returns.
    pub fn subscribe(&self, subscriber: impl Subscriber<T>) -> Subscription {
        self.activate(Box::new(subscriber))
    }

    /// Activates the task, only observing values.
    pub fn subscribe_fn(&self, on_value: impl FnMut(T) + Send + 'static) -> Subscription {
        self.subscribe(FnSubscriber::new().on_value(on_value))
    }

    /// Lazy single-resolution view: subscribes on first poll, resolves with the
    /// first value.
    pub fn await_once(&self) -> Pending<T> {
        Pending::from_source(self.clone())
    }

    /// Runs `next` after this task completes.
    pub fn then(&self, next: impl Source<T>) -> Sequence<T> {
        let wiring = Wiring {
            task: None,
            ..self.inner.wiring.clone()
        };
        Sequence::wired(wiring).then(self.clone()).then(next)
    }
}

impl<T, U> Source<T> for DeferredTask<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    fn activate(&self, subscriber: Box<dyn Subscriber<T>>) -> Subscription {
        let inner = &self.inner;
        let inv = Invocation::new(&inner.wiring);
        let kind = inner.delay.kind();
        let requested = match kind {
            DelayKind::Duration(d) => Some(d),
            _ => None,
        };
        inv.schedule(subscriber, kind.as_label(), requested);
        let sub = Subscription::new(inv.clone(), inner.wiring.cancel_on_drop);
        driver::start(&inv, &inner.delay, &inner.value);
        sub
    }
}

impl<T, U> IntoFuture for DeferredTask<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    type Output = Result<T, crate::DeferError>;
    type IntoFuture = Pending<T>;

    fn into_future(self) -> Self::IntoFuture {
        Pending::from_source(self)
    }
}

impl<T, U> IntoFuture for &DeferredTask<T, U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    type Output = Result<T, crate::DeferError>;
    type IntoFuture = Pending<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.await_once()
    }
}

impl<T: fmt::Debug, U: fmt::Debug> fmt::Debug for DeferredTask<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTask")
            .field("name", &self.inner.wiring.task)
            .field("delay", &self.inner.delay)
            .field("value", &self.inner.value)
            .finish()
    }
}
