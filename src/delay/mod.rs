//! # Delay resolution.
//!
//! Turns the "when" of a deferred task into a cancelable wait:
//! - [`DelaySpec`] the tagged delay (immediate / duration / pending signal)
//! - [`Signal`] / [`Settler`] an externally settled single-value source
//!
//! `DelaySpec::begin` is the resolver contract: it answers either "ready now"
//! (immediate) or hands back a lazy future for the invocation's armed driver.

mod signal;
mod spec;

pub use signal::{Settler, Signal};
pub use spec::{DelayKind, DelaySpec};

pub(crate) use spec::Wait;
