use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{config::PoolConfig, pool::Pool, registry::Registry, worker::RunContext};
use crate::{
    events::Bus,
    store::StoreRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Pool`] with optional subscribers.
pub struct PoolBuilder {
    cfg: PoolConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl PoolBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: PoolConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (worker lifecycle, reconcile outcomes)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the pool and starts its reconcile loop.
    ///
    /// The pool lives until `lifetime` is cancelled, [`Pool::shutdown`] is
    /// called, or the last handle is dropped. Must be called within a tokio runtime.
    pub fn build(self, lifetime: &CancellationToken, store: StoreRef) -> Arc<Pool> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let (tx, rx) = mpsc::channel(self.cfg.update_capacity_clamped());
        let token = lifetime.child_token();

        let registry = Arc::new(Registry::new(
            RunContext {
                bus: bus.clone(),
                updates: tx,
                pace: self.cfg.pace,
            },
            token.clone(),
        ));
        let subs = SubscriberSet::new(self.subscribers, bus.clone());

        Arc::new(Pool::start(self.cfg, bus, registry, subs, store, rx, token))
    }
}
