//! # Subscribable sources.
//!
//! [`Source`] is the push protocol: every `activate` creates one independent
//! invocation. Deferred tasks, sequences and stream factories implement it,
//! and any source can be relayed by another task through
//! [`ValueSpec::relay`](crate::ValueSpec::relay).

use std::sync::Arc;

use super::{Subscriber, Subscription};

/// Something that can be subscribed to, any number of times.
pub trait Source<T>: Send + Sync + 'static {
    /// Starts one activation delivering to `subscriber`.
    fn activate(&self, subscriber: Box<dyn Subscriber<T>>) -> Subscription;
}

impl<T, S> Source<T> for Arc<S>
where
    S: Source<T> + ?Sized,
{
    fn activate(&self, subscriber: Box<dyn Subscriber<T>>) -> Subscription {
        (**self).activate(subscriber)
    }
}
