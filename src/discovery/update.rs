//! # Publishing handle for discovery results.
//!
//! [`UpdateSender`] is what a [`Discoverer`](crate::Discoverer) receives on each
//! cycle. It stamps every status with the worker's [`EntityKey`] and pushes it
//! onto the pool's single bounded update channel.
//!
//! ## Rules
//! - **Backpressure**: a full channel makes `send` wait; updates are never dropped.
//! - **Run-scoped**: each sender belongs to one run of one worker. Once that run
//!   is cancelled (stop, remove, pool shutdown) `send` refuses with
//!   [`SendError::Cancelled`], including while waiting on a full channel, so a
//!   stale run can never publish for a slot that was removed or re-created.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::entity::{EntityKey, EntityStatus, StatusUpdate};
use crate::error::SendError;

/// Run-scoped sender of [`StatusUpdate`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct UpdateSender {
    key: EntityKey,
    tx: mpsc::Sender<StatusUpdate>,
    run: CancellationToken,
    published: Arc<AtomicU64>,
}

impl UpdateSender {
    pub(crate) fn new(key: EntityKey, tx: mpsc::Sender<StatusUpdate>, run: CancellationToken) -> Self {
        Self {
            key,
            tx,
            run,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Entity this sender publishes for.
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Returns `true` once the owning run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.run.is_cancelled()
    }

    /// Publishes the observed status, waiting for channel capacity if needed.
    pub async fn send(&self, status: EntityStatus) -> Result<(), SendError> {
        if self.run.is_cancelled() {
            return Err(SendError::Cancelled);
        }
        let update = StatusUpdate::new(self.key.clone(), status);

        tokio::select! {
            biased;
            _ = self.run.cancelled() => Err(SendError::Cancelled),
            res = self.tx.send(update) => match res {
                Ok(()) => {
                    self.published.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                Err(_) => Err(SendError::Closed),
            },
        }
    }

    /// Total updates accepted by the channel through this sender and its clones.
    pub(crate) fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Endpoint;
    use std::time::Duration;

    fn status(addr: &str) -> EntityStatus {
        EntityStatus::new(vec![Endpoint::ready(addr)])
    }

    #[tokio::test]
    async fn test_send_stamps_key() {
        let (tx, mut rx) = mpsc::channel(4);
        let key = EntityKey::new("ns", "a");
        let sender = UpdateSender::new(key.clone(), tx, CancellationToken::new());

        sender.send(status("e1")).await.expect("send");
        let got = rx.recv().await.expect("update");
        assert_eq!(got.key, key);
        assert_eq!(got.status, status("e1"));
        assert_eq!(sender.published(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_channel_blocks_instead_of_dropping() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = UpdateSender::new(EntityKey::new("ns", "a"), tx, CancellationToken::new());

        sender.send(status("e1")).await.expect("first send fits");

        let blocked = tokio::time::timeout(Duration::from_secs(5), sender.send(status("e2"))).await;
        assert!(blocked.is_err(), "second send must wait for capacity");

        let pending = {
            let sender = sender.clone();
            tokio::spawn(async move { sender.send(status("e3")).await })
        };
        assert_eq!(rx.recv().await.expect("e1").status, status("e1"));
        pending.await.expect("join").expect("send after capacity freed");
        assert_eq!(rx.recv().await.expect("e3").status, status("e3"));
    }

    #[tokio::test]
    async fn test_cancelled_run_cannot_publish() {
        let (tx, mut rx) = mpsc::channel(1);
        let run = CancellationToken::new();
        let sender = UpdateSender::new(EntityKey::new("ns", "a"), tx, run.clone());

        run.cancel();
        assert_eq!(sender.send(status("e1")).await, Err(SendError::Cancelled));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_releases_blocked_send() {
        let (tx, _rx) = mpsc::channel(1);
        let run = CancellationToken::new();
        let sender = UpdateSender::new(EntityKey::new("ns", "a"), tx, run.clone());
        sender.send(status("e1")).await.expect("fits");

        let waiter = {
            let sender = sender.clone();
            tokio::spawn(async move { sender.send(status("e2")).await })
        };
        tokio::task::yield_now().await;
        run.cancel();
        assert_eq!(waiter.await.expect("join"), Err(SendError::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_channel_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = UpdateSender::new(EntityKey::new("ns", "a"), tx, CancellationToken::new());
        assert_eq!(sender.send(status("e1")).await, Err(SendError::Closed));
    }
}
