//! # Lifecycle event bus.
//!
//! Every invocation of a tracked task publishes its transitions here; the
//! [`Tracker`](crate::Tracker) listener and any caller of
//! [`Tracker::events`](crate::Tracker::events) read them back.
//!
//! ```text
//! Invocation ─┐
//! Invocation ─┼─► Bus (ring of `capacity` events) ─► Tracker listener
//! ObserverSet ┘                                  └─► Tracker::events() receivers
//! ```
//!
//! Publishing never waits and needs no runtime. A receiver that falls more
//! than `capacity` events behind gets `RecvError::Lagged` and resumes at the
//! oldest retained event; the tracker then rebuilds its live view from the
//! registry.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable sender side of the lifecycle event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining up to `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to every current receiver; dropped when nobody listens.
    pub fn publish(&self, ev: Event) {
        if self.has_receivers() {
            let _ = self.tx.send(ev);
        }
    }

    /// True if at least one receiver is attached.
    ///
    /// Invocations check this before building an event.
    pub fn has_receivers(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// A new receiver that sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        assert!(!bus.has_receivers());
        bus.publish(Event::new(EventKind::InvocationFired));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::InvocationScheduled));

        let mut rx = bus.subscribe();
        assert!(bus.has_receivers());
        bus.publish(Event::new(EventKind::InvocationFired).with_invocation(3));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::InvocationFired);
        assert_eq!(ev.invocation, Some(3));
    }

    #[test]
    fn lagging_receiver_skips_to_the_retained_tail() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for id in 1..=4 {
            bus.publish(Event::new(EventKind::InvocationFired).with_invocation(id));
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(2))
        ));
        assert_eq!(rx.try_recv().expect("event").invocation, Some(3));
    }
}
