use std::sync::Arc;

use crate::events::Bus;
use crate::tracker::Registry;

/// Where an invocation reports to: its task name, the event bus and the
/// tracker registry. Detached tasks carry the default (nothing).
#[derive(Clone, Default)]
pub(crate) struct Wiring {
    pub(crate) task: Option<Arc<str>>,
    pub(crate) bus: Option<Bus>,
    pub(crate) registry: Option<Arc<Registry>>,
    pub(crate) cancel_on_drop: bool,
}

impl Wiring {
    pub(crate) fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.task = Some(name.into());
        self
    }
}
