//! # State store abstraction.
//!
//! The [`StateStore`] is the authoritative home of every entity's last-known
//! status. The pool only ever reads one status and writes one status per
//! update; conflict resolution and retries belong to the store.
//!
//! [`MemoryStore`] is a process-local implementation for tests and demos.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::entity::{EntityKey, EntityStatus, StatusUpdate};
use crate::error::StoreError;

pub use memory::MemoryStore;

/// Shared handle to a state store.
pub type StoreRef = Arc<dyn StateStore>;

/// # Persistence contract consumed by the reconcile loop.
///
/// Both calls receive a token that is cancelled when the reconcile attempt
/// times out or the pool shuts down; implementations should abort promptly.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Returns the persisted status of `key`.
    ///
    /// Returns [`StoreError::NotFound`] if the entity does not exist.
    async fn get(&self, ctx: CancellationToken, key: &EntityKey) -> Result<EntityStatus, StoreError>;

    /// Persists `update.status` for `update.key`.
    ///
    /// Returns [`StoreError::NotFound`] if the entity was deleted; the pool
    /// then drops the entity's worker.
    async fn update_status(
        &self,
        ctx: CancellationToken,
        update: &StatusUpdate,
    ) -> Result<(), StoreError>;
}
