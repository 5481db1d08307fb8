//! # Function-backed discoverer (`DiscoverFn`)
//!
//! [`DiscoverFn`] wraps a closure `F: Fn(CancellationToken, UpdateSender) -> Fut`,
//! producing a fresh future per discovery cycle. Shared state between cycles
//! must be held explicitly (`Arc<...>` captured by the closure).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use discoverpool::{
//!     DiscoverFn, Discoverer, DiscovererRef, Endpoint, EntityKey, EntityStatus, UpdateSender,
//! };
//!
//! let d: DiscovererRef = DiscoverFn::arc(
//!     Some(EntityKey::new("prod", "api")),
//!     |ctx: CancellationToken, tx: UpdateSender| async move {
//!         let _ = tx.send(EntityStatus::new(vec![Endpoint::ready("10.0.0.1:80")])).await;
//!         ctx.cancelled().await;
//!     },
//! );
//!
//! assert_eq!(d.component(), Some(EntityKey::new("prod", "api")));
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::discovery::{Discoverer, UpdateSender};
use crate::entity::EntityKey;

/// Function-backed discoverer implementation.
#[derive(Debug)]
pub struct DiscoverFn<F> {
    component: Option<EntityKey>,
    f: F,
}

impl<F> DiscoverFn<F> {
    /// Creates a new function-backed discoverer.
    ///
    /// Prefer [`DiscoverFn::arc`] when you immediately need a [`DiscovererRef`](crate::DiscovererRef).
    pub fn new(component: Option<EntityKey>, f: F) -> Self {
        Self { component, f }
    }

    /// Creates the discoverer and returns it as a shared handle.
    pub fn arc(component: Option<EntityKey>, f: F) -> Arc<Self> {
        Arc::new(Self::new(component, f))
    }
}

#[async_trait]
impl<F, Fut> Discoverer for DiscoverFn<F>
where
    F: Fn(CancellationToken, UpdateSender) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn component(&self) -> Option<EntityKey> {
        self.component.clone()
    }

    async fn discover(&self, ctx: CancellationToken, updates: UpdateSender) {
        (self.f)(ctx, updates).await
    }
}
