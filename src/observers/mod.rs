//! # Event observers.
//!
//! This module provides the [`Observe`] trait, the [`ObserverSet`] fan-out and
//! built-in implementations for handling lifecycle events published on a
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//!   Invocation ── publish(Event) ──► Bus ──► Tracker listener
//!                                              │
//!                                              ├──► AliveTracker (live invocation view)
//!                                              └──► ObserverSet::emit(&Event)
//!                                                        │
//!                                                   ┌────┴────┬─────────┐
//!                                                   ▼         ▼         ▼
//!                                               LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod observe;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;
