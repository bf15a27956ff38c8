//! Invocation state machine: one activation of a deferred task.
//!
//! Internal modules:
//! - `state`: the public [`InvocationState`] enum;
//! - `machine`: the per-activation state machine;
//! - `driver`: delay wait, value resolution and relays;
//! - `handle`: the owned wait resource;
//! - `wiring`: where events and registrations go.

use std::sync::Arc;

mod machine;
pub(crate) mod driver;
mod handle;
mod state;
mod wiring;

pub(crate) use machine::Invocation;
pub(crate) use handle::WaitHandle;
pub use state::InvocationState;
pub(crate) use wiring::Wiring;

/// Type-erased control surface of an invocation.
pub(crate) trait Lifecycle: Send + Sync {
    /// Global invocation id.
    fn id(&self) -> u64;
    /// Current state.
    fn state(&self) -> InvocationState;
    /// Moves to `Canceled`; `false` if already terminal.
    fn cancel(&self) -> bool;
    /// Name of the task that created it.
    fn task(&self) -> Option<Arc<str>> {
        None
    }
}
