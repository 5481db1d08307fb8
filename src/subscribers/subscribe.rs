//! # Subscriber trait
//!
//! Implement [`Subscribe`] to observe pool events (worker lifecycle, reconcile
//! outcomes, timeouts). Each subscriber gets its own bounded lane inside the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet), so it may do slow work
//! without holding up the pool or other subscribers. When the lane is full the
//! event is dropped for that subscriber and `SubscriberOverflow` is published.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use discoverpool::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct WriteCounter(AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for WriteCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::StatusUpdated {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "write-counter" }
//!     fn queue_capacity(&self) -> usize { 512 }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Receiver of runtime events, called from its own task.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Lane capacity.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
