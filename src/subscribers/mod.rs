//! # Event subscribers for the pool runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and (with the `logging` feature) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Worker / Reconcile ── publish(Event) ──► Bus ──► Pool listener ──► SubscriberSet
//!                                                                       │
//!                                                             ┌─────────┼─────────┐
//!                                                             ▼         ▼         ▼
//!                                                         LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
