//! # Tracker configuration.
//!
//! Provides [`Config`], the settings shared by every task created through a
//! [`Tracker`](crate::Tracker).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the bus

/// Settings applied to tasks created through a [`Tracker`](crate::Tracker).
///
/// ## Field semantics
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `cancel_on_drop`: dropping a [`Subscription`](crate::Subscription) cancels its invocation
///
/// Tasks built with the free [`deferred_task`](crate::deferred_task) function are
/// detached: they publish no events and never cancel on drop.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the lifecycle event broadcast channel.
    ///
    /// Observers that lag behind more than `bus_capacity` events skip the oldest
    /// ones. Minimum value is 1.
    pub bus_capacity: usize,

    /// Whether dropping a [`Subscription`](crate::Subscription) cancels the invocation.
    ///
    /// With `false` a dropped handle leaves the invocation running to completion,
    /// and only an explicit `unsubscribe()` (or [`Tracker::cancel_all`](crate::Tracker::cancel_all))
    /// stops it.
    pub cancel_on_drop: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `cancel_on_drop = false`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            cancel_on_drop: false,
        }
    }
}
