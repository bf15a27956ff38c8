//! Tracking: event wiring and lifecycle bookkeeping for tasks.
//!
//! The public API from this module is [`Tracker`] (with its builder) and the
//! [`AliveTracker`] view it maintains.
//!
//! Internal modules:
//! - `tracker`: owns the bus, observers, live view and registry;
//! - `builder`: assembles a tracker;
//! - `alive`: sequence-ordered view of live invocations;
//! - `registry`: weak handles for bulk cancellation.

mod alive;
mod builder;
mod registry;
#[allow(clippy::module_inception)]
mod tracker;

pub use alive::{AliveTracker, LiveInvocation};
pub use builder::TrackerBuilder;
pub(crate) use registry::Registry;
pub use tracker::Tracker;
