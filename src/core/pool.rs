//! # Pool: keyed discovery workers + one serialized reconcile loop.
//!
//! The [`Pool`] owns the worker registry, the single bounded update
//! channel, the event bus and the reconcile loop.
//!
//! ## High-level architecture
//! ```text
//! callers ──► add_or_update / remove ──► Registry (one lock)
//!                                          │
//!                               Worker per key (own run token)
//!                                          │ UpdateSender::send (blocks when full)
//!                                          ▼
//!                          mpsc::channel(update_capacity)  ── FIFO, single consumer
//!                                          ▼
//!                                   reconcile loop ──► reconcile_once ──► StateStore
//!                                          │
//!                                          ├─ Gone  ──► Registry::remove(key)
//!                                          └─ panic ──► ReconcilePanicked, next update
//!
//! Events: Registry / Worker / reconcile ── publish ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## Lifecycle
//! - Building the pool starts the reconcile loop (and the subscriber listener).
//! - The pool token is a child of the host's lifetime token; cancelling either
//!   stops every worker and the reconcile loop.
//! - [`Pool::shutdown`] cancels, then waits up to `grace` for run loops to exit.
//! - Dropping the last handle cancels the pool token.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use discoverpool::{
//!     AddOutcome, DiscoverFn, Endpoint, EntityKey, EntityStatus, MemoryStore, Pool, UpdateSender,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = EntityKey::new("prod", "api");
//!     let store = Arc::new(MemoryStore::new());
//!     store.insert(key.clone());
//!
//!     let lifetime = CancellationToken::new();
//!     let pool = Pool::new(&lifetime, store.clone());
//!
//!     let outcome = pool.add_or_update(DiscoverFn::arc(
//!         Some(key.clone()),
//!         |ctx: CancellationToken, tx: UpdateSender| async move {
//!             let _ = tx.send(EntityStatus::new(vec![Endpoint::ready("10.0.0.1:80")])).await;
//!             ctx.cancelled().await;
//!         },
//!     ));
//!     assert_eq!(outcome, AddOutcome::Created);
//!     assert_eq!(pool.size(), 1);
//!
//!     pool.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    builder::PoolBuilder,
    config::PoolConfig,
    reconcile::{ReconcileOutcome, reconcile_once},
    registry::{AddOutcome, Registry},
    worker::WorkerHandle,
};
use crate::{
    discovery::{Discoverer, DiscovererRef},
    entity::{EntityKey, StatusUpdate},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    store::StoreRef,
    subscribers::{SubscriberSet, panic_message},
};

/// Keyed pool of discovery workers feeding one reconcile loop.
pub struct Pool {
    cfg: PoolConfig,
    bus: Bus,
    registry: Arc<Registry>,
    token: CancellationToken,
    listener_token: CancellationToken,
    reconciler: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Pool {
    /// Returns a builder for a pool with the given configuration.
    pub fn builder(cfg: PoolConfig) -> PoolBuilder {
        PoolBuilder::new(cfg)
    }

    /// Builds a pool with [`PoolConfig::default`] and no subscribers.
    ///
    /// Starts the reconcile loop immediately. Must be called within a tokio runtime.
    pub fn new(lifetime: &CancellationToken, store: StoreRef) -> Arc<Self> {
        PoolBuilder::new(PoolConfig::default()).build(lifetime, store)
    }

    pub(super) fn start(
        cfg: PoolConfig,
        bus: Bus,
        registry: Arc<Registry>,
        subs: SubscriberSet,
        store: StoreRef,
        updates: mpsc::Receiver<StatusUpdate>,
        token: CancellationToken,
    ) -> Self {
        let listener_token = CancellationToken::new();
        let listener = if subs.is_empty() {
            None
        } else {
            Some(tokio::spawn(subscriber_listener(
                bus.subscribe(),
                subs,
                listener_token.clone(),
            )))
        };

        let reconciler = tokio::spawn(reconcile_loop(
            Arc::clone(&registry),
            updates,
            store,
            token.clone(),
            cfg.reconcile_timeout(),
            bus.clone(),
        ));

        Self {
            cfg,
            bus,
            registry,
            token,
            listener_token,
            reconciler: Mutex::new(Some(reconciler)),
            listener: Mutex::new(listener),
        }
    }

    /// Registers `discoverer`, or hands it to the existing worker of its entity.
    ///
    /// - no entity identity → [`AddOutcome::Ignored`]
    /// - unknown key → new worker started ([`AddOutcome::Created`])
    /// - known key, running → discoverer replaced ([`AddOutcome::Replaced`])
    /// - known key, stopped → discoverer replaced, loop restarted ([`AddOutcome::Restarted`])
    pub fn add_or_update(&self, discoverer: DiscovererRef) -> AddOutcome {
        self.registry.add_or_update(discoverer)
    }

    /// Stops and unregisters the worker of `key`. Does not wait for it to exit.
    ///
    /// Returns `true` if a worker was registered.
    pub fn remove(&self, key: &EntityKey) -> bool {
        self.registry.remove(key)
    }

    /// Same as [`remove`](Self::remove), from the identity parts.
    pub fn remove_by_key(&self, namespace: &str, name: &str) -> bool {
        self.remove(&EntityKey::new(namespace, name))
    }

    /// Same as [`remove`](Self::remove), for the entity `discoverer` watches.
    ///
    /// A discoverer without identity removes nothing.
    pub fn remove_discoverer(&self, discoverer: &dyn Discoverer) -> bool {
        discoverer
            .component()
            .is_some_and(|key| self.remove(&key))
    }

    /// Number of registered entities.
    pub fn size(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Sorted snapshot of registered keys.
    pub fn keys(&self) -> Vec<EntityKey> {
        self.registry.keys()
    }

    /// Handle to the worker currently registered for `key`.
    pub fn worker(&self, key: &EntityKey) -> Option<WorkerHandle> {
        self.registry.get(key)
    }

    /// Receiver for runtime events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.cfg
    }

    /// Returns `true` once the pool token is cancelled.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels all workers and the reconcile loop, then waits up to
    /// [`PoolConfig::grace`] for them to exit.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] and returns [`RuntimeError::GraceExceeded`]
    /// with the keys of workers still running. Subscribers are flushed before
    /// returning. Workers removed earlier are not awaited.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.token.cancel();

        let drained = self.registry.drain();
        let reconciler = self.reconciler.lock().take();
        let grace = self.cfg.grace;

        let (workers, joins): (Vec<WorkerHandle>, Vec<Option<JoinHandle<()>>>) =
            drained.into_iter().unzip();

        let done = async {
            for join in joins.into_iter().flatten().chain(reconciler) {
                let _ = join.await;
            }
        };

        let res = match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let mut stuck: Vec<EntityKey> = workers
                    .iter()
                    .filter(|w| !w.is_stopped())
                    .map(|w| w.key().clone())
                    .collect();
                stuck.sort_unstable();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck_reason(&stuck)),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        self.listener_token.cancel();
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        res
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.token.cancel();
        self.listener_token.cancel();
    }
}

fn stuck_reason(stuck: &[EntityKey]) -> String {
    stuck
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Single consumer of the update channel. Exits only on pool cancellation.
async fn reconcile_loop(
    registry: Arc<Registry>,
    mut updates: mpsc::Receiver<StatusUpdate>,
    store: StoreRef,
    token: CancellationToken,
    timeout: Option<Duration>,
    bus: Bus,
) {
    bus.publish(Event::new(EventKind::PoolStarted));
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = updates.recv() => {
                let Some(update) = msg else { break };
                let attempt = reconcile_once(store.as_ref(), &update, &token, timeout, &bus);
                match AssertUnwindSafe(attempt).catch_unwind().await {
                    Ok(ReconcileOutcome::Gone) => {
                        // Already gone if removed while the write was in flight.
                        if registry.remove(&update.key) {
                            bus.publish(Event::new(EventKind::EntityGone).with_key(&update.key));
                        }
                    }
                    Ok(_) => {}
                    Err(payload) => bus.publish(
                        Event::new(EventKind::ReconcilePanicked)
                            .with_key(&update.key)
                            .with_reason(panic_message(&*payload)),
                    ),
                }
            }
        }
    }
    bus.publish(Event::new(EventKind::PoolStopped));
}

/// Forwards bus events to the subscriber set; drains what is queued on stop.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    stop: CancellationToken,
) {
    use broadcast::error::{RecvError, TryRecvError};

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(ev) => subs.emit(&ev),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => {
                loop {
                    match rx.try_recv() {
                        Ok(ev) => subs.emit(&ev),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                break;
            }
        }
    }
    subs.shutdown().await;
}
