//! # Invocation: one activation of a deferred task.
//!
//! Owns the subscriber, the state and the single live [`WaitHandle`].
//!
//! ## Rules
//! - All state lives behind one mutex; it is **never** held across a subscriber
//!   callback, so callbacks may re-entrantly cancel their own subscription.
//! - Every delivery re-checks the state under the lock first; once `Canceled`
//!   nothing is delivered, whatever the driver is doing.
//! - The wait handle is `take()`n exactly once, on the terminal transition.
//! - A terminal notification raised while a value is being delivered is parked
//!   and delivered right after that value, keeping `on_value → on_complete` order.
//! - Values emitted while another value is being delivered are queued and
//!   delivered in order by the emitter already in flight.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::error::DeferError;
use crate::events::{Event, EventKind};
use crate::protocol::Subscriber;

use super::{InvocationState, Lifecycle, WaitHandle, Wiring};

/// Global invocation id counter.
static INVOCATION_ID: AtomicU64 = AtomicU64::new(1);

/// Terminal notification owed to the subscriber.
enum Outcome {
    Complete,
    Fail(DeferError),
}

impl Outcome {
    fn deliver<T: 'static>(self, subscriber: &mut dyn Subscriber<T>) {
        match self {
            Outcome::Complete => subscriber.on_complete(),
            Outcome::Fail(err) => subscriber.on_error(err),
        }
    }
}

struct Slot<T> {
    state: InvocationState,
    subscriber: Option<Box<dyn Subscriber<T>>>,
    wait: Option<WaitHandle>,
    parked: Option<Outcome>,
    queued: VecDeque<T>,
}

/// One activation: state machine plus owned resources.
pub(crate) struct Invocation<T> {
    id: u64,
    wiring: Wiring,
    slot: Mutex<Slot<T>>,
}

impl<T: Send + 'static> Invocation<T> {
    pub(crate) fn new(wiring: &Wiring) -> Arc<Self> {
        Arc::new(Self {
            id: INVOCATION_ID.fetch_add(1, AtomicOrdering::Relaxed),
            wiring: wiring.clone(),
            slot: Mutex::new(Slot {
                state: InvocationState::Idle,
                subscriber: None,
                wait: None,
                parked: None,
                queued: VecDeque::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `Idle → Scheduled`: registers the subscriber.
    ///
    /// Publishes `InvocationScheduled` before any other event of this invocation
    /// can exist, since nothing has been spawned yet.
    pub(crate) fn schedule(
        self: &Arc<Self>,
        subscriber: Box<dyn Subscriber<T>>,
        delay_kind: &'static str,
        delay: Option<Duration>,
    ) {
        {
            let mut slot = self.lock();
            if slot.state != InvocationState::Idle {
                return;
            }
            slot.state = InvocationState::Scheduled;
            slot.subscriber = Some(subscriber);
        }
        if let Some(registry) = &self.wiring.registry {
            let handle: Weak<dyn Lifecycle> = Arc::downgrade(self) as Weak<dyn Lifecycle>;
            registry.insert(self.id, handle);
        }
        self.publish(EventKind::InvocationScheduled, |ev| {
            let ev = ev.with_delay_kind(delay_kind);
            match delay {
                Some(d) => ev.with_delay(d),
                None => ev,
            }
        });
    }

    /// `Scheduled → Firing`. Returns `false` if the invocation is no longer waiting.
    pub(crate) fn fire(&self) -> bool {
        {
            let mut slot = self.lock();
            if slot.state != InvocationState::Scheduled {
                return false;
            }
            slot.state = InvocationState::Firing;
        }
        self.publish(EventKind::InvocationFired, |ev| ev);
        true
    }

    /// True while the invocation has not reached a terminal state.
    pub(crate) fn is_live(&self) -> bool {
        !self.lock().state.is_terminal()
    }

    /// Installs the owned wait resource.
    ///
    /// If the invocation already reached a terminal state the handle is
    /// released on the spot; otherwise the previous handle is retired.
    pub(crate) fn arm(&self, wait: WaitHandle) {
        let previous = {
            let mut slot = self.lock();
            if slot.state.is_terminal() {
                Err(wait)
            } else {
                Ok(slot.wait.replace(wait))
            }
        };
        match previous {
            Err(released) => drop(released),
            Ok(Some(old)) => old.retire(),
            Ok(None) => {}
        }
    }

    /// Delivers one value (`→ Emitting`). Dropped silently unless firing/emitting.
    ///
    /// A value emitted while `on_value` is running is queued behind it.
    pub(crate) fn emit(&self, value: T) {
        let taken = {
            let mut slot = self.lock();
            if !slot.state.accepts_values() {
                return;
            }
            slot.state = InvocationState::Emitting;
            match slot.subscriber.take() {
                Some(s) => Some((s, value)),
                None => {
                    slot.queued.push_back(value);
                    None
                }
            }
        };
        self.publish(EventKind::ValueEmitted, |ev| ev);
        let Some((mut subscriber, value)) = taken else {
            return;
        };
        subscriber.on_value(value);

        loop {
            let next = {
                let mut slot = self.lock();
                if let Some(queued) = slot.queued.pop_front() {
                    Ok(queued)
                } else if slot.state.is_terminal() {
                    Err(slot.parked.take())
                } else {
                    slot.subscriber = Some(subscriber);
                    return;
                }
            };
            match next {
                Ok(queued) => subscriber.on_value(queued),
                Err(parked) => {
                    if let Some(outcome) = parked {
                        outcome.deliver(subscriber.as_mut());
                    }
                    return;
                }
            }
        }
    }

    /// `→ Completed`, delivering `on_complete` once.
    pub(crate) fn complete(&self) {
        self.finish(Outcome::Complete);
    }

    /// `→ Errored`, delivering `on_error` once.
    pub(crate) fn fail(&self, err: DeferError) {
        self.finish(Outcome::Fail(err));
    }

    fn finish(&self, outcome: Outcome) {
        let (kind, error) = match &outcome {
            Outcome::Complete => (EventKind::InvocationCompleted, None),
            Outcome::Fail(err) => (EventKind::InvocationErrored, Some(err.to_string())),
        };
        let (subscriber, wait, outcome) = {
            let mut slot = self.lock();
            if slot.state.is_terminal() {
                return;
            }
            slot.state = match outcome {
                Outcome::Complete => InvocationState::Completed,
                Outcome::Fail(_) => InvocationState::Errored,
            };
            let wait = slot.wait.take();
            match slot.subscriber.take() {
                Some(s) => (Some(s), wait, Some(outcome)),
                None => {
                    // a value is in flight; `emit` delivers this after it
                    slot.parked = Some(outcome);
                    (None, wait, None)
                }
            }
        };
        drop(wait);
        self.deregister();
        self.publish(kind, |ev| match error {
            Some(e) => ev.with_error(e),
            None => ev,
        });
        if let (Some(mut subscriber), Some(outcome)) = (subscriber, outcome) {
            outcome.deliver(subscriber.as_mut());
        }
    }

    fn deregister(&self) {
        if let Some(registry) = &self.wiring.registry {
            registry.remove(self.id);
        }
    }

    fn publish(&self, kind: EventKind, build: impl FnOnce(Event) -> Event) {
        if let Some(bus) = self.wiring.bus.as_ref().filter(|bus| bus.has_receivers()) {
            let ev = Event::new(kind)
                .with_invocation(self.id)
                .with_task_opt(self.wiring.task.as_ref());
            bus.publish(build(ev));
        }
    }
}

impl<T: Send + 'static> Lifecycle for Invocation<T> {
    fn id(&self) -> u64 {
        self.id
    }

    fn state(&self) -> InvocationState {
        self.lock().state
    }

    fn cancel(&self) -> bool {
        let (subscriber, wait, queued) = {
            let mut slot = self.lock();
            if slot.state.is_terminal() {
                return false;
            }
            slot.state = InvocationState::Canceled;
            slot.parked = None;
            (
                slot.subscriber.take(),
                slot.wait.take(),
                std::mem::take(&mut slot.queued),
            )
        };
        drop(wait);
        drop(subscriber);
        drop(queued);
        self.deregister();
        self.publish(EventKind::InvocationCanceled, |ev| ev);
        true
    }

    fn task(&self) -> Option<Arc<str>> {
        self.wiring.task.clone()
    }
}
