//! # Runtime event bus.
//!
//! [`Bus`] wraps a [`tokio::sync::broadcast`] sender shared by the registry,
//! every worker run loop and the reconcile loop.
//!
//! ```text
//!   Registry  ──┐
//!   Worker N  ──┼──► Bus ──► Pool listener ──► SubscriberSet
//!   Reconcile ──┘      └───► Pool::subscribe() receivers
//! ```
//!
//! Publishing never waits. A receiver that falls behind sees
//! `RecvError::Lagged` and skips the oldest events; events published with no
//! receiver attached are gone. Status updates never travel here: they use the
//! pool's bounded mpsc channel, which applies backpressure instead.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable publishing handle for runtime [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Ring buffer of `capacity` events, at least one.
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel::<Event>(capacity.max(1)).0,
        }
    }

    pub fn publish(&self, ev: Event) {
        // Err only means nobody is listening.
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receiver_sees_events_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::PoolStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::WorkerAdded));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::WorkerAdded);
    }
}
