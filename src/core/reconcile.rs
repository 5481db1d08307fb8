//! # Reconcile one status update against the state store.
//!
//! Turns one [`StatusUpdate`] into at most one store write, publishing the
//! outcome to the [`Bus`].
//!
//! ## Flow
//! ```text
//! child token ──► timeout(attempt)
//!                   ├─► store.get(key)
//!                   │     ├─ Ok(prior)      → compare
//!                   │     ├─ Err(NotFound)  → prior unknown, write
//!                   │     └─ Err(other)     → StatusFetchFailed, write
//!                   ├─► incoming == prior   → StatusUnchanged (no write)
//!                   └─► store.update_status(update)
//!                         ├─ Ok             → StatusUpdated
//!                         ├─ Err(NotFound)  → Gone (caller removes the worker)
//!                         └─ Err(other)     → StatusUpdateFailed (no retry)
//! timeout elapsed  ──► cancel child, ReconcileTimeout
//! ```
//!
//! ## Rules
//! - Never retries; the next update from the worker is the retry.
//! - Fetch and write are not atomic with respect to other writers of the store.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::entity::StatusUpdate;
use crate::events::{Bus, Event, EventKind};
use crate::store::StateStore;

/// Result of one reconcile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReconcileOutcome {
    /// Incoming status equals the stored one.
    Unchanged,
    /// Incoming status was written.
    Updated,
    /// The store reported the entity as deleted.
    Gone,
    /// The write failed for another reason.
    Failed,
    /// The attempt did not finish in time.
    TimedOut,
}

/// Reconciles `update` against `store`, bounded by `timeout`.
///
/// Store calls receive a child of `parent` that is cancelled on timeout.
pub(crate) async fn reconcile_once<S: StateStore + ?Sized>(
    store: &S,
    update: &StatusUpdate,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    bus: &Bus,
) -> ReconcileOutcome {
    let child = parent.child_token();

    match timeout {
        Some(dur) => match time::timeout(dur, attempt(store, update, child.clone(), bus)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                child.cancel();
                bus.publish(
                    Event::new(EventKind::ReconcileTimeout)
                        .with_key(&update.key)
                        .with_timeout(dur),
                );
                ReconcileOutcome::TimedOut
            }
        },
        None => attempt(store, update, child, bus).await,
    }
}

async fn attempt<S: StateStore + ?Sized>(
    store: &S,
    update: &StatusUpdate,
    ctx: CancellationToken,
    bus: &Bus,
) -> ReconcileOutcome {
    let prior = match store.get(ctx.clone(), &update.key).await {
        Ok(status) => Some(status),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            bus.publish(
                Event::new(EventKind::StatusFetchFailed)
                    .with_key(&update.key)
                    .with_reason(e.to_string()),
            );
            None
        }
    };

    if prior.as_ref() == Some(&update.status) {
        bus.publish(Event::new(EventKind::StatusUnchanged).with_key(&update.key));
        return ReconcileOutcome::Unchanged;
    }

    match store.update_status(ctx, update).await {
        Ok(()) => {
            bus.publish(Event::new(EventKind::StatusUpdated).with_key(&update.key));
            ReconcileOutcome::Updated
        }
        Err(e) if e.is_not_found() => ReconcileOutcome::Gone,
        Err(e) => {
            bus.publish(
                Event::new(EventKind::StatusUpdateFailed)
                    .with_key(&update.key)
                    .with_reason(e.to_string()),
            );
            ReconcileOutcome::Failed
        }
    }
}
