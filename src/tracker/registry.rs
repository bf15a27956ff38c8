//! # Registry of live invocations.
//!
//! Invocations created by a [`Tracker`](crate::Tracker)'s tasks register on
//! `Scheduled` and deregister on their terminal transition. The registry only
//! holds `Weak` handles: it never keeps an invocation alive.
//!
//! ## Rules
//! - `insert` / `remove` are synchronous and idempotent.
//! - `cancel_all` snapshots the handles under the lock and cancels them after
//!   releasing it, since canceling deregisters (re-locks).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::invocation::Lifecycle;

/// Live invocations by id.
#[derive(Default)]
pub(crate) struct Registry {
    live: Mutex<HashMap<u64, Weak<dyn Lifecycle>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Weak<dyn Lifecycle>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, id: u64, handle: Weak<dyn Lifecycle>) {
        self.lock().insert(id, handle);
    }

    pub(crate) fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    /// Number of registered invocations still reachable.
    pub(crate) fn len(&self) -> usize {
        let mut live = self.lock();
        live.retain(|_, h| h.strong_count() > 0);
        live.len()
    }

    /// Handles of the registered invocations still reachable.
    pub(crate) fn handles(&self) -> Vec<Arc<dyn Lifecycle>> {
        let mut live = self.lock();
        live.retain(|_, h| h.strong_count() > 0);
        live.values().filter_map(Weak::upgrade).collect()
    }

    /// Cancels every registered invocation; returns how many were canceled.
    pub(crate) fn cancel_all(&self) -> usize {
        let handles: Vec<_> = self.lock().drain().filter_map(|(_, h)| h.upgrade()).collect();
        handles.iter().filter(|h| h.cancel()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::InvocationState;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Stub {
        id: u64,
        canceled: AtomicBool,
    }

    impl Lifecycle for Stub {
        fn id(&self) -> u64 {
            self.id
        }
        fn state(&self) -> InvocationState {
            if self.canceled.load(Ordering::SeqCst) {
                InvocationState::Canceled
            } else {
                InvocationState::Scheduled
            }
        }
        fn cancel(&self) -> bool {
            !self.canceled.swap(true, Ordering::SeqCst)
        }
    }

    fn stub(id: u64) -> Arc<Stub> {
        Arc::new(Stub {
            id,
            canceled: AtomicBool::new(false),
        })
    }

    #[test]
    fn cancel_all_reaches_every_live_handle() {
        let reg = Registry::new();
        let (a, b) = (stub(1), stub(2));
        reg.insert(1, Arc::downgrade(&a) as Weak<dyn Lifecycle>);
        reg.insert(2, Arc::downgrade(&b) as Weak<dyn Lifecycle>);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.cancel_all(), 2);
        assert_eq!(a.state(), InvocationState::Canceled);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn dropped_invocations_are_not_counted() {
        let reg = Registry::new();
        let a = stub(1);
        reg.insert(1, Arc::downgrade(&a) as Weak<dyn Lifecycle>);
        drop(a);
        assert_eq!(reg.len(), 0);
        assert_eq!(reg.cancel_all(), 0);
    }

    #[test]
    fn handles_skip_dropped_invocations() {
        let reg = Registry::new();
        let (a, b) = (stub(1), stub(2));
        reg.insert(1, Arc::downgrade(&a) as Weak<dyn Lifecycle>);
        reg.insert(2, Arc::downgrade(&b) as Weak<dyn Lifecycle>);
        drop(b);
        let ids: Vec<u64> = reg.handles().iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![1]);
    }
}
