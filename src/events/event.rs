//! # Runtime events emitted by the pool, its workers and the reconcile loop.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker events**: registry and run-loop lifecycle (added, starting, stopped, removed)
//! - **Reconcile events**: outcome of each status update (updated, unchanged, failed, gone)
//! - **Pool events**: start, stop and shutdown grace results
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, entity key,
//! run generation, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use discoverpool::{EntityKey, Event, EventKind};
//!
//! let ev = Event::new(EventKind::StatusUpdateFailed)
//!     .with_key(&EntityKey::new("prod", "api"))
//!     .with_reason("store unavailable")
//!     .with_timeout(Duration::from_secs(10));
//!
//! assert_eq!(ev.kind, EventKind::StatusUpdateFailed);
//! assert_eq!(ev.key.as_deref(), Some("prod/api"));
//! assert_eq!(ev.reason.as_deref(), Some("store unavailable"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::entity::EntityKey;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Pool events ===
    /// Reconcile loop started consuming updates.
    PoolStarted,

    /// Reconcile loop exited (pool token cancelled).
    PoolStopped,

    /// All workers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    ///
    /// Sets:
    /// - `reason`: stuck entity keys
    GraceExceeded,

    // === Worker events ===
    /// A new worker was registered for an entity.
    ///
    /// Sets:
    /// - `key`: entity key
    WorkerAdded,

    /// A worker run loop is starting.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `generation`: run generation (1-based, per worker)
    WorkerStarting,

    /// A worker run loop exited.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `generation`: run generation that exited
    WorkerStopped,

    /// The discoverer panicked; the worker is stopped until the next `add_or_update`.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `generation`: run generation
    /// - `reason`: panic message
    WorkerPanicked,

    /// The discoverer of an existing worker was replaced.
    ///
    /// Sets:
    /// - `key`: entity key
    DiscovererReplaced,

    /// A stopped worker was started again.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `generation`: new run generation
    WorkerRestarted,

    /// A worker was removed from the registry (explicitly or by self-healing).
    ///
    /// Sets:
    /// - `key`: entity key
    WorkerRemoved,

    /// A discovery cycle published nothing; the worker sleeps before the next one.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `delay_ms`: pacing delay (ms)
    IdleBackoff,

    // === Reconcile events ===
    /// Incoming status equals the stored one; nothing written.
    ///
    /// Sets:
    /// - `key`: entity key
    StatusUnchanged,

    /// Incoming status was written to the store.
    ///
    /// Sets:
    /// - `key`: entity key
    StatusUpdated,

    /// Reading the stored status failed; the write proceeds anyway.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `reason`: store error
    StatusFetchFailed,

    /// Writing the status failed with a non-"not found" error; not retried.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `reason`: store error
    StatusUpdateFailed,

    /// The store reported the entity as deleted; its worker was removed.
    ///
    /// Sets:
    /// - `key`: entity key
    EntityGone,

    /// The reconcile attempt exceeded its timeout.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `timeout_ms`: configured timeout (ms)
    ReconcileTimeout,

    /// The store panicked during a reconcile attempt; the loop moved on.
    ///
    /// Sets:
    /// - `key`: entity key
    /// - `reason`: panic message
    ReconcilePanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Entity key (`namespace/name`) or subscriber name, if applicable.
    pub key: Option<Arc<str>>,
    /// Worker run generation.
    pub generation: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Delay before the next cycle in milliseconds (compact).
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            generation: None,
            reason: None,
            timeout_ms: None,
            delay_ms: None,
        }
    }

    /// Attaches an entity key.
    #[inline]
    pub fn with_key(mut self, key: &EntityKey) -> Self {
        self.key = Some(key.to_string().into());
        self
    }

    /// Attaches a free-form name (used for subscriber names).
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.key = Some(name.into());
        self
    }

    /// Attaches a run generation.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::WorkerAdded);
        let b = Event::new(EventKind::WorkerAdded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_are_clamped() {
        let ev = Event::new(EventKind::IdleBackoff).with_delay(Duration::from_secs(u64::MAX / 2));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
