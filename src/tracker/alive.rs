//! # Live invocation tracker with sequence-based ordering.
//!
//! Maintains an eventually consistent view of which invocations are live,
//! built from bus events and using sequence numbers to reject stale ones.
//!
//! ## Architecture
//! ```text
//! Invocation ──► Bus ──► Tracker listener ──► AliveTracker::update()
//!                                                    │
//!                                                    ▼
//!                                      HashMap<u64, Entry>
//!                                  (invocation id → {seq, task, state})
//! ```
//!
//! ## Rules
//! - `InvocationScheduled` inserts; it is always the first event of an invocation.
//! - `Fired` / `ValueEmitted` update the state of a known invocation.
//! - Terminal events remove the entry.
//! - Events with `seq <= last_seq` for their invocation are **rejected** (stale).
//! - Events without an invocation id (observer events) are ignored.
//! - After lost events, `reconcile` resets the view to the registry's handles.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::invocation::{InvocationState, Lifecycle};
use crate::observers::Observe;

#[derive(Debug, Clone)]
struct Entry {
    last_seq: u64,
    task: Option<Arc<str>>,
    state: InvocationState,
}

/// A live invocation as seen through events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveInvocation {
    /// Invocation id.
    pub id: u64,
    /// Name of the task that created it, if named.
    pub task: Option<Arc<str>>,
    /// Last observed state.
    pub state: InvocationState,
}

/// Thread-safe tracker of live invocations.
#[derive(Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<u64, Entry>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event; returns `true` if it changed the view.
    ///
    /// ```text
    /// update(Scheduled, seq=10)  → live, Scheduled
    /// update(Fired,     seq=12)  → live, Firing
    /// update(Scheduled, seq=11)  → rejected (stale)
    /// update(Completed, seq=13)  → removed
    /// ```
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(id) = ev.invocation else {
            return false;
        };
        let mut state = self.state.write().await;

        if ev.kind == EventKind::InvocationScheduled {
            if state.get(&id).is_some_and(|e| ev.seq <= e.last_seq) {
                return false;
            }
            state.insert(
                id,
                Entry {
                    last_seq: ev.seq,
                    task: ev.task.clone(),
                    state: InvocationState::Scheduled,
                },
            );
            return true;
        }

        let Some(entry) = state.get_mut(&id) else {
            return false;
        };
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        match ev.kind {
            EventKind::InvocationFired => {
                entry.state = InvocationState::Firing;
                true
            }
            EventKind::ValueEmitted => {
                entry.state = InvocationState::Emitting;
                true
            }
            kind if kind.is_terminal() => {
                state.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Rebuilds the view from the authoritative `live` handles.
    ///
    /// Used after events were lost: entries for ended invocations are dropped,
    /// and invocations whose `Scheduled` event was lost are added. Returns the
    /// number of entries dropped.
    pub(crate) async fn reconcile(&self, live: &[Arc<dyn Lifecycle>]) -> usize {
        let current: HashMap<u64, &Arc<dyn Lifecycle>> = live
            .iter()
            .filter(|h| !h.state().is_terminal())
            .map(|h| (h.id(), h))
            .collect();
        let mut state = self.state.write().await;
        let before = state.len();
        state.retain(|id, _| current.contains_key(id));
        let dropped = before - state.len();
        for (id, handle) in current {
            state.entry(id).or_insert_with(|| Entry {
                last_seq: 0,
                task: handle.task(),
                state: handle.state(),
            });
        }
        dropped
    }

    /// Live invocations sorted by id.
    pub async fn snapshot(&self) -> Vec<LiveInvocation> {
        let state = self.state.read().await;
        let mut live: Vec<LiveInvocation> = state
            .iter()
            .map(|(id, e)| LiveInvocation {
                id: *id,
                task: e.task.clone(),
                state: e.state,
            })
            .collect();
        live.sort_unstable_by_key(|l| l.id);
        live
    }

    /// True if the invocation is currently live.
    pub async fn is_alive(&self, id: u64) -> bool {
        self.state.read().await.contains_key(&id)
    }
}

#[async_trait]
impl Observe for AliveTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "alive"
    }
}
