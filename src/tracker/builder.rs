use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::DeferError;
use crate::events::Bus;
use crate::observers::{Observe, ObserverSet};

use super::{alive::AliveTracker, registry::Registry, tracker::Tracker};

/// Builder for a [`Tracker`] with optional observers.
pub struct TrackerBuilder {
    cfg: Config,
    observers: Vec<Arc<dyn Observe>>,
}

impl TrackerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Sets event observers.
    ///
    /// Observers receive lifecycle events through dedicated workers with
    /// bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds one observer.
    pub fn observer(mut self, observer: impl Observe) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Builds the tracker and spawns its listener and observer workers.
    ///
    /// # Errors
    /// [`DeferError::NoRuntime`] outside of a tokio runtime.
    pub fn build(self) -> Result<Arc<Tracker>, DeferError> {
        let rt = Handle::try_current().map_err(|_| DeferError::NoRuntime)?;
        let _enter = rt.enter();

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let observers = ObserverSet::new(self.observers, bus.clone());
        let registry = Arc::new(Registry::new());
        let alive = Arc::new(AliveTracker::new());
        let stop = CancellationToken::new();

        Ok(Arc::new(Tracker::start(
            self.cfg, bus, observers, registry, alive, stop,
        )))
    }
}
