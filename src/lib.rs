//! # discoverpool
//!
//! **discoverpool** keeps one long-lived discovery worker per entity and
//! funnels everything they observe through a single reconcile loop that
//! writes changed statuses to a state store.
//!
//! Typical use: an operator watches many services; for each one a discoverer
//! resolves its endpoints and reports them; the pool deduplicates the reports
//! against the store, writes only what changed and drops workers of entities
//! that were deleted.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Discoverer  │   │  Discoverer  │   │  Discoverer  │
//!     │  (ns/api)    │   │  (ns/db)     │   │  (ns/cache)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ add_or_update    ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Pool                                                             │
//! │  - Registry (one Worker per EntityKey, one lock)                  │
//! │  - bounded update channel (backpressure on workers)               │
//! │  - reconcile loop (single consumer, FIFO)                         │
//! │  - Bus + SubscriberSet (runtime events)                           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Worker    │   │    Worker    │   │    Worker    │
//!     │ (run loop)   │   │ (run loop)   │   │ (run loop)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ UpdateSender::send(EntityStatus)    │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │              mpsc channel (PoolConfig::update_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │     reconcile loop     │
//!                       │ get ─► compare ─► write│
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                      StateStore      Registry::remove
//!                                     (entity deleted)
//! ```
//!
//! ### Worker lifecycle
//! ```text
//! Created ──start()──► Running ──stop() / pool cancel / panic──► Stopped
//!                         ▲                                        │
//!                         └──── add_or_update (same key) ──────────┘
//!                               fresh child token, generation + 1
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------------|---------------------------------------------|
//! | **Pool**          | Register, replace, restart and remove workers by entity key.      | [`Pool`], [`AddOutcome`]                    |
//! | **Discovery**     | Long-running probes that publish observed statuses.               | [`Discoverer`], [`DiscoverFn`], [`UpdateSender`] |
//! | **Store**         | Where reconciled statuses are written.                            | [`StateStore`], [`MemoryStore`]             |
//! | **Subscriber API**| Hook into worker and reconcile events (logging, metrics).         | [`Subscribe`], [`Event`]                    |
//! | **Pacing**        | Optional delay for discoverers that return without reporting.     | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Errors**        | Typed errors for stores, sends and shutdown.                      | [`StoreError`], [`SendError`], [`RuntimeError`] |
//! | **Configuration** | Centralize runtime settings.                                      | [`PoolConfig`]                              |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use discoverpool::{
//!     DiscoverFn, Endpoint, EntityKey, EntityStatus, MemoryStore, Pool, PoolConfig, UpdateSender,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = EntityKey::new("prod", "api");
//!     let store = Arc::new(MemoryStore::new());
//!     store.insert(key.clone());
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn discoverpool::Subscribe>> = vec![Arc::new(discoverpool::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn discoverpool::Subscribe>> = Vec::new();
//!
//!     let lifetime = CancellationToken::new();
//!     let pool = Pool::builder(PoolConfig::default())
//!         .with_subscribers(subs)
//!         .build(&lifetime, store.clone());
//!
//!     // Reports the same endpoint every 10ms; only the first report is written.
//!     pool.add_or_update(DiscoverFn::arc(
//!         Some(key.clone()),
//!         |ctx: CancellationToken, tx: UpdateSender| async move {
//!             let _ = tx.send(EntityStatus::new(vec![Endpoint::ready("10.0.0.1:80")])).await;
//!             tokio::select! {
//!                 _ = tokio::time::sleep(Duration::from_millis(10)) => {}
//!                 _ = ctx.cancelled() => {}
//!             }
//!         },
//!     ));
//!
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     assert_eq!(store.writes(), 1);
//!
//!     pool.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod discovery;
mod entity;
mod error;
mod events;
mod policies;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use core::{AddOutcome, Pool, PoolBuilder, PoolConfig, Worker, WorkerHandle};
pub use discovery::{DiscoverFn, Discoverer, DiscovererRef, UpdateSender};
pub use entity::{Endpoint, EndpointState, EntityKey, EntityStatus, StatusUpdate};
pub use error::{RuntimeError, SendError, StoreError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use store::{MemoryStore, StateStore, StoreRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Built-in subscriber rendering events through `tracing`.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
