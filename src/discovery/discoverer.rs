//! # Discoverer abstraction.
//!
//! A [`Discoverer`] probes one entity for its observable state and publishes
//! what it finds through an [`UpdateSender`]. The pool runs each discoverer in
//! a cancellable loop; [`DiscovererRef`] is the shared handle type.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::discovery::UpdateSender;
use crate::entity::EntityKey;

/// Shared handle to a discoverer.
pub type DiscovererRef = Arc<dyn Discoverer>;

/// # Probes a single entity and reports its status.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use discoverpool::{Discoverer, Endpoint, EntityKey, EntityStatus, UpdateSender};
///
/// struct Static(EntityKey);
///
/// #[async_trait]
/// impl Discoverer for Static {
///     fn component(&self) -> Option<EntityKey> { Some(self.0.clone()) }
///
///     async fn discover(&self, ctx: CancellationToken, updates: UpdateSender) {
///         let status = EntityStatus::new(vec![Endpoint::ready("127.0.0.1:8080")]);
///         if updates.send(status).await.is_err() {
///             return;
///         }
///         ctx.cancelled().await;
///     }
/// }
/// ```
#[async_trait]
pub trait Discoverer: Send + Sync + 'static {
    /// Entity this discoverer watches; `None` makes registration a no-op.
    fn component(&self) -> Option<EntityKey>;

    /// Runs one discovery cycle.
    ///
    /// Should block until it has something to report or `ctx` is cancelled,
    /// and must return promptly once `ctx` is cancelled. Errors are the
    /// discoverer's own concern; it should return rather than block forever.
    async fn discover(&self, ctx: CancellationToken, updates: UpdateSender);
}
