//! # Event fan-out to subscribers.
//!
//! [`SubscriberSet`] gives every subscriber its own bounded lane and a task
//! draining it, so a slow or panicking subscriber only affects itself.
//!
//! ```text
//! emit(ev) ─► Arc<Event> ─┬─► lane "LogWriter" ──► drain ──► on_event
//!                         ├─► lane "metrics"   ──► drain ──► on_event
//!                         └─► lane full/closed ──► SubscriberOverflow on the Bus
//! ```
//!
//! Each lane is FIFO; there is no ordering between lanes. `emit` never waits.
//! A panic inside `on_event` is caught (`AssertUnwindSafe`), reported as
//! `SubscriberPanicked`, and the lane keeps draining. State a subscriber
//! guards with a lock may be left half-updated by such a panic.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// One subscriber's queue.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

impl Lane {
    /// Queues `ev`, or names why it was dropped.
    fn offer(&self, ev: &Arc<Event>) -> Result<(), &'static str> {
        self.tx.try_send(Arc::clone(ev)).map_err(|e| match e {
            TrySendError::Full(_) => "full",
            TrySendError::Closed(_) => "closed",
        })
    }
}

/// Subscribers of one pool, each behind its own bounded lane.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    drains: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one drain task per subscriber. Must be called within a tokio runtime.
    ///
    /// Lane capacity is [`Subscribe::queue_capacity`], at least one.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (lanes, drains) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane { name: sub.name(), tx };
                (lane, tokio::spawn(drain(sub, rx, bus.clone())))
            })
            .unzip();
        Self { lanes, drains, bus }
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Offers a copy of `event` to every lane.
    pub fn emit(&self, event: &Event) {
        if !self.is_empty() {
            self.emit_arc(Arc::new(event.clone()));
        }
    }

    /// Offers `event` to every lane without copying it.
    ///
    /// A dropped `SubscriberOverflow` does not produce another one.
    pub fn emit_arc(&self, event: Arc<Event>) {
        for lane in &self.lanes {
            if let Err(why) = lane.offer(&event) {
                if !event.is_subscriber_overflow() {
                    self.bus.publish(Event::subscriber_overflow(lane.name, why));
                }
            }
        }
    }

    /// Closes every lane and waits until each drain task has delivered what was queued.
    pub async fn shutdown(self) {
        let Self { lanes, drains, .. } = self;
        drop(lanes);
        for d in drains {
            let _ = d.await;
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let delivered = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(payload) = delivered {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*payload)));
        }
    }
}

/// Text of a panic payload, for `&str` and `String` payloads.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&'static str>() {
        Some(msg) => (*msg).to_owned(),
        None => payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_else(|| "unknown panic".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _ev: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber exploded");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn test_events_reach_every_subscriber() {
        let bus = Bus::new(16);
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        let set = SubscriberSet::new(vec![a.clone(), b.clone()], bus);

        set.emit(&Event::new(EventKind::StatusUpdated));
        set.emit(&Event::new(EventKind::StatusUnchanged));
        set.shutdown().await;

        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_is_reported_on_bus() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Panicky)], bus);

        set.emit(&Event::new(EventKind::WorkerAdded));
        set.shutdown().await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.key.as_deref(), Some("panicky"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber exploded"));
    }
}
