//! # Discovery abstractions.
//!
//! This module provides the discovery-related types:
//! - [`Discoverer`] - trait for probing one entity in cancellable cycles
//! - [`DiscoverFn`] - closure-backed discoverer
//! - [`DiscovererRef`] - shared reference to a discoverer (`Arc<dyn Discoverer>`)
//! - [`UpdateSender`] - run-scoped handle for publishing statuses

mod discover_fn;
mod discoverer;
mod update;

pub use discover_fn::DiscoverFn;
pub use discoverer::{Discoverer, DiscovererRef};
pub use update::UpdateSender;
