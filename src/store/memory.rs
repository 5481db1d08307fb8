use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::entity::{EntityKey, EntityStatus, StatusUpdate};
use crate::error::StoreError;
use crate::store::StateStore;

/// In-memory [`StateStore`].
///
/// Entities must be [`insert`](MemoryStore::insert)ed before their status can
/// be written; writes for unknown entities fail with [`StoreError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: Mutex<HashMap<EntityKey, EntityStatus>>,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity with an empty status. Existing status is kept.
    pub fn insert(&self, key: EntityKey) {
        self.entities.lock().entry(key).or_default();
    }

    /// Deletes an entity; later writes for it fail with `NotFound`.
    pub fn delete(&self, key: &EntityKey) -> bool {
        self.entities.lock().remove(key).is_some()
    }

    /// Returns the stored status of `key`, if the entity exists.
    pub fn status(&self, key: &EntityKey) -> Option<EntityStatus> {
        self.entities.lock().get(key).cloned()
    }

    /// Number of successful status writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, _ctx: CancellationToken, key: &EntityKey) -> Result<EntityStatus, StoreError> {
        self.status(key)
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }

    async fn update_status(
        &self,
        _ctx: CancellationToken,
        update: &StatusUpdate,
    ) -> Result<(), StoreError> {
        let mut entities = self.entities.lock();
        match entities.get_mut(&update.key) {
            Some(status) => {
                *status = update.status.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(StoreError::NotFound {
                key: update.key.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Endpoint;

    #[tokio::test]
    async fn test_write_requires_existing_entity() {
        let store = MemoryStore::new();
        let key = EntityKey::new("ns", "a");
        let update = StatusUpdate::new(key.clone(), EntityStatus::new(vec![Endpoint::ready("e1")]));

        let err = store
            .update_status(CancellationToken::new(), &update)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store.insert(key.clone());
        store
            .update_status(CancellationToken::new(), &update)
            .await
            .expect("write");
        assert_eq!(store.status(&key), Some(update.status.clone()));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_get_after_delete_is_not_found() {
        let store = MemoryStore::new();
        let key = EntityKey::new("ns", "a");
        store.insert(key.clone());
        assert_eq!(
            store.get(CancellationToken::new(), &key).await,
            Ok(EntityStatus::default())
        );

        assert!(store.delete(&key));
        assert_eq!(
            store.get(CancellationToken::new(), &key).await,
            Err(StoreError::NotFound { key })
        );
    }
}
