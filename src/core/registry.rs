//! # Worker registry - one slot per entity key.
//!
//! Registry owns every worker of the pool and is the only place workers are
//! created, restarted or dropped.
//!
//! ## Architecture
//! ```text
//! Pool.add_or_update(d) ─► lock ─► key = d.component()
//!                                  ├─ absent          → Worker::new + start  (Created)
//!                                  ├─ present running → update_discoverer     (Replaced)
//!                                  └─ present stopped → update_discoverer + start (Restarted)
//! Pool.remove(key)       ─► lock ─► stop + delete slot (no join)
//! reconcile loop (Gone)  ─► remove(key)
//! ```
//!
//! ## Rules
//! - One mutex covers every read and mutation (including `len`).
//! - No `.await` while the lock is held.
//! - A removed slot is never reused: a later add creates a new worker.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::worker::{RunContext, Worker, WorkerHandle};
use crate::discovery::DiscovererRef;
use crate::entity::EntityKey;
use crate::events::{Event, EventKind};

/// What [`Pool::add_or_update`](crate::Pool::add_or_update) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new worker was registered and started.
    Created,
    /// The running worker's discoverer was replaced.
    Replaced,
    /// The stopped worker's discoverer was replaced and its loop restarted.
    Restarted,
    /// Nothing happened: no entity identity, or the pool is shut down.
    Ignored,
}

/// Registry entry.
struct Slot {
    worker: WorkerHandle,
    /// Join handle of the latest run; dropped (detached) on removal.
    join: Option<JoinHandle<()>>,
}

pub(crate) struct Registry {
    workers: Mutex<HashMap<EntityKey, Slot>>,
    ctx: RunContext,
    token: CancellationToken,
}

impl Registry {
    pub(crate) fn new(ctx: RunContext, token: CancellationToken) -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
            ctx,
            token,
        }
    }

    pub(crate) fn add_or_update(&self, discoverer: DiscovererRef) -> AddOutcome {
        let Some(key) = discoverer.component() else {
            return AddOutcome::Ignored;
        };

        let mut workers = self.workers.lock();
        if self.token.is_cancelled() {
            return AddOutcome::Ignored;
        }

        if let Some(slot) = workers.get_mut(&key) {
            slot.worker.update_discoverer(discoverer);
            self.ctx
                .bus
                .publish(Event::new(EventKind::DiscovererReplaced).with_key(&key));

            if !slot.worker.is_stopped() {
                return AddOutcome::Replaced;
            }
            slot.join = Some(slot.worker.start(&self.token, &self.ctx));
            self.ctx.bus.publish(
                Event::new(EventKind::WorkerRestarted)
                    .with_key(&key)
                    .with_generation(slot.worker.generation()),
            );
            return AddOutcome::Restarted;
        }

        let worker = Worker::new(key.clone(), discoverer);
        self.ctx
            .bus
            .publish(Event::new(EventKind::WorkerAdded).with_key(&key));
        let join = worker.start(&self.token, &self.ctx);
        workers.insert(
            key,
            Slot {
                worker,
                join: Some(join),
            },
        );
        AddOutcome::Created
    }

    /// Stops and deletes the slot of `key`. Returns whether it existed.
    pub(crate) fn remove(&self, key: &EntityKey) -> bool {
        let mut workers = self.workers.lock();
        let Some(slot) = workers.remove(key) else {
            return false;
        };
        slot.worker.stop();
        drop(workers);

        self.ctx
            .bus
            .publish(Event::new(EventKind::WorkerRemoved).with_key(key));
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub(crate) fn keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self.workers.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub(crate) fn get(&self, key: &EntityKey) -> Option<WorkerHandle> {
        self.workers.lock().get(key).map(|slot| slot.worker.clone())
    }

    /// Empties the registry, stopping every worker. Returns the handles to join.
    pub(crate) fn drain(&self) -> Vec<(WorkerHandle, Option<JoinHandle<()>>)> {
        let drained: Vec<Slot> = self.workers.lock().drain().map(|(_, slot)| slot).collect();
        drained
            .into_iter()
            .map(|slot| {
                slot.worker.stop();
                (slot.worker, slot.join)
            })
            .collect()
    }
}
