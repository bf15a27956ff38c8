//! # Dual-protocol adapter.
//!
//! Exposes deferred work through two protocols:
//! - **subscribe** ([`Source`], [`Subscriber`], [`Subscription`]): push-based,
//!   one fresh invocation per activation;
//! - **await** ([`Pending`], `IntoFuture`): single resolution with the first value.
//!
//! Sources provided here:
//! - [`DeferredTask`] a delay paired with a value;
//! - [`Sequence`] sources run back to back ([`concat`], [`DeferredTask::then`]);
//! - [`StreamFn`] a `futures::Stream` factory.

mod pending;
mod sequence;
mod source;
mod stream;
mod subscriber;
mod subscription;
mod task;

pub use pending::Pending;
pub use sequence::{Sequence, concat};
pub use source::Source;
pub use stream::StreamFn;
pub use subscriber::{FnSubscriber, Subscriber};
pub use subscription::Subscription;
pub use task::DeferredTask;
