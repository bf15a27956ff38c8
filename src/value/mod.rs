//! # Value resolution.
//!
//! Turns the "what" of a deferred task into a value, an eventual value or a
//! source of values. See [`ValueSpec`] for the variants.

mod resolver;
mod spec;

pub use spec::{AsyncThunkFn, ThunkFn, ValueSpec};

pub(crate) use resolver::{Resolved, resolve};
