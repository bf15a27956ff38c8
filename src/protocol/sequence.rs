//! # Sequential composition.
//!
//! A [`Sequence`] activates its steps one after another: step `n + 1` is
//! subscribed only once step `n` completed. Values of every step are relayed
//! in order, an error ends the sequence, and canceling the sequence cancels the
//! step currently running.
//!
//! ```text
//! activate ─► step[0] ──complete──► step[1] ──complete──► ... ─► on_complete
//!               │                     │
//!               └─ values ─► subscriber ◄─ values
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::invocation::{Invocation, Wiring, driver};

use super::{Pending, Source, Subscriber, Subscription};

type Steps<T> = Arc<Vec<Arc<dyn Source<T>>>>;

/// Sources run back to back.
pub struct Sequence<T> {
    steps: Steps<T>,
    wiring: Wiring,
}

impl<T: Send + 'static> Sequence<T> {
    /// An empty sequence; it completes immediately when activated.
    pub fn new() -> Self {
        Self::wired(Wiring::default())
    }

    pub(crate) fn wired(wiring: Wiring) -> Self {
        Self {
            steps: Arc::new(Vec::new()),
            wiring,
        }
    }

    /// Appends a step.
    pub fn then(mut self, next: impl Source<T>) -> Self {
        Arc::make_mut(&mut self.steps).push(Arc::new(next));
        self
    }

    /// Names the sequence's own invocation events.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.wiring = self.wiring.named(name);
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Activates the sequence.
    pub fn subscribe(&self, subscriber: impl Subscriber<T>) -> Subscription {
        self.activate(Box::new(subscriber))
    }

    /// Resolves with the first value of the sequence.
    pub fn await_once(&self) -> Pending<T> {
        Pending::from_source(self.clone())
    }
}

/// Builds a [`Sequence`] from `sources`.
///
/// ```rust
/// use std::time::Duration;
/// use afterthought::{DelaySpec, ValueSpec, concat, deferred_task};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let one = deferred_task(DelaySpec::immediate(), ValueSpec::literal(1));
/// let two = deferred_task(DelaySpec::after(Duration::from_millis(1)), ValueSpec::literal(2));
/// let seq = concat([one, two]);
/// assert_eq!(seq.len(), 2);
/// assert_eq!(seq.await_once().await, Ok(1));
/// # }
/// ```
pub fn concat<T, S, I>(sources: I) -> Sequence<T>
where
    T: Send + 'static,
    S: Source<T>,
    I: IntoIterator<Item = S>,
{
    sources
        .into_iter()
        .fold(Sequence::new(), |seq, step| seq.then(step))
}

/// Hand-off states between `advance` and a step's completion continuation.
const ACTIVATING: u8 = 0;
const FINISHED: u8 = 1;
const DETACHED: u8 = 2;

/// Runs steps from `index` on.
///
/// A step that completes while it is being activated is followed by the next
/// one in this loop; only a step that completes later continues from its own
/// callback. Long runs of synchronous steps therefore use constant stack.
fn advance<T: Send + 'static>(inv: &Arc<Invocation<T>>, steps: Steps<T>, mut index: usize) {
    while inv.is_live() {
        let Some(step) = steps.get(index).cloned() else {
            inv.complete();
            return;
        };
        let handoff = Arc::new(AtomicU8::new(ACTIVATING));
        let then = {
            let handoff = Arc::clone(&handoff);
            let inv = Arc::clone(inv);
            let steps = Arc::clone(&steps);
            move || {
                let settled =
                    handoff.compare_exchange(ACTIVATING, FINISHED, Ordering::AcqRel, Ordering::Acquire);
                if settled.is_err() {
                    advance(&inv, steps, index + 1);
                }
            }
        };
        driver::relay(inv, step.as_ref(), Some(Box::new(then)));
        let detached =
            handoff.compare_exchange(ACTIVATING, DETACHED, Ordering::AcqRel, Ordering::Acquire);
        if detached.is_ok() {
            return;
        }
        index += 1;
    }
}

impl<T: Send + 'static> Source<T> for Sequence<T> {
    fn activate(&self, subscriber: Box<dyn Subscriber<T>>) -> Subscription {
        let inv = Invocation::new(&self.wiring);
        inv.schedule(subscriber, "sequence", None);
        let sub = Subscription::new(inv.clone(), self.wiring.cancel_on_drop);
        if inv.fire() {
            advance(&inv, Arc::clone(&self.steps), 0);
        }
        sub
    }
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
            wiring: self.wiring.clone(),
        }
    }
}

impl<T: Send + 'static> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("steps", &self.steps.len())
            .field("name", &self.wiring.task)
            .finish()
    }
}
