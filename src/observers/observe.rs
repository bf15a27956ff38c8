//! # Observer trait.
//!
//! [`Observe`] is the extension point for plugging event handlers into a
//! [`Tracker`](crate::Tracker): metrics export, structured logging, alerting.
//!
//! Each observer gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-observer bounded queue** (capacity via [`Observe::queue_capacity`])
//! - **Panic isolation** (panics are reported as `EventKind::ObserverPanicked`)
//!
//! ## Architecture
//! ```text
//! ObserverSet ──► [bounded queue] ──► worker task ──► observer.on_event()
//!                                  └─► panic caught → EventKind::ObserverPanicked
//! ```
//!
//! ## Overflow behavior
//! 1) The new event is **dropped** for this observer only.
//! 2) An `EventKind::ObserverOverflow` is published.
//! 3) Other observers are unaffected.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use afterthought::{Event, EventKind, Observe};
//!
//! struct Failures;
//!
//! #[async_trait]
//! impl Observe for Failures {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::InvocationErrored {
//!             eprintln!("invocation {:?} failed: {:?}", ev.invocation, ev.error);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event observer for lifecycle events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order per observer.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity, clamped to a minimum of 1. Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
