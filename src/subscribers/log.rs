//! # LogWriter - events rendered through `tracing`
//!
//! A subscriber that turns incoming [`Event`]s into `tracing` records. The host
//! decides where they go by installing a `tracing` subscriber.
//!
//! | Level   | Kinds                                                             |
//! |---------|-------------------------------------------------------------------|
//! | `error` | `StatusUpdateFailed`, `ReconcilePanicked`, `WorkerPanicked`, `SubscriberPanicked`, `GraceExceeded` |
//! | `warn`  | `StatusFetchFailed`, `ReconcileTimeout`, `SubscriberOverflow`     |
//! | `info`  | pool/worker lifecycle, `StatusUpdated`, `EntityGone`              |
//! | `debug` | `StatusUnchanged`, `IdleBackoff`                                  |

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::PoolStarted => info!("discover pool started"),
            EventKind::PoolStopped => info!("discover pool stopped"),
            EventKind::AllStoppedWithin => info!("all discover workers stopped within grace"),
            EventKind::GraceExceeded => error!(stuck = reason, "discover pool grace exceeded"),
            EventKind::WorkerAdded => info!(key, "discover worker added"),
            EventKind::WorkerStarting => {
                info!(key, generation = e.generation, "discover worker started")
            }
            EventKind::WorkerStopped => {
                info!(key, generation = e.generation, "discover worker stopped")
            }
            EventKind::WorkerRestarted => {
                info!(key, generation = e.generation, "discover worker restarted")
            }
            EventKind::WorkerPanicked => error!(
                key,
                generation = e.generation,
                panic = reason,
                "discoverer panicked"
            ),
            EventKind::DiscovererReplaced => debug!(key, "discoverer replaced"),
            EventKind::WorkerRemoved => info!(key, "discover worker removed"),
            EventKind::IdleBackoff => debug!(key, delay_ms = e.delay_ms, "discover cycle idle"),
            EventKind::StatusUnchanged => debug!(key, "status unchanged"),
            EventKind::StatusUpdated => info!(key, "update component status success"),
            EventKind::StatusFetchFailed => warn!(key, error = reason, "get component status failure"),
            EventKind::StatusUpdateFailed => {
                error!(key, error = reason, "update component status failure")
            }
            EventKind::EntityGone => info!(key, "component not found, discover worker removed"),
            EventKind::ReconcileTimeout => {
                warn!(key, timeout_ms = e.timeout_ms, "reconcile timed out")
            }
            EventKind::ReconcilePanicked => {
                error!(key, panic = reason, "reconcile attempt panicked")
            }
            EventKind::SubscriberOverflow => warn!(subscriber = key, reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => {
                error!(subscriber = key, panic = reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
