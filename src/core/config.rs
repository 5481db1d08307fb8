//! # Pool runtime configuration.
//!
//! Provides [`PoolConfig`] centralized settings for the pool runtime.
//!
//! ## Sentinel values
//! - `reconcile_timeout = 0s` → reconcile attempts are not time-bounded
//! - `pace = None` → no pacing between discovery cycles
//! - capacities are clamped to a minimum of 1

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the pool runtime.
///
/// ## Field semantics
/// - `update_capacity`: Size of the shared update channel (backpressure threshold)
/// - `reconcile_timeout`: Upper bound for one fetch+compare+write attempt (`0s` = none)
/// - `grace`: Maximum wait for workers to stop in [`Pool::shutdown`](crate::Pool::shutdown)
/// - `bus_capacity`: Event bus ring buffer size
/// - `pace`: Optional delay policy after discovery cycles that published nothing
///
/// All fields are public. Prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Capacity of the single update channel shared by all workers.
    ///
    /// When full, workers wait in [`UpdateSender::send`](crate::UpdateSender::send).
    pub update_capacity: usize,

    /// Timeout applied to each reconcile attempt.
    ///
    /// The store calls receive a token that is cancelled when it elapses.
    pub reconcile_timeout: Duration,

    /// Maximum time [`Pool::shutdown`](crate::Pool::shutdown) waits for run loops to exit.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Pacing for idle discovery cycles (`None` = run the next cycle immediately).
    pub pace: Option<BackoffPolicy>,
}

impl PoolConfig {
    /// Returns the update channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn update_capacity_clamped(&self) -> usize {
        self.update_capacity.max(1)
    }

    /// Returns the reconcile timeout as an `Option` (`None` for `0s`).
    #[inline]
    pub fn reconcile_timeout(&self) -> Option<Duration> {
        if self.reconcile_timeout == Duration::ZERO {
            None
        } else {
            Some(self.reconcile_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `update_capacity = 1024`
    /// - `reconcile_timeout = 10s`
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    /// - `pace = None`
    fn default() -> Self {
        Self {
            update_capacity: 1024,
            reconcile_timeout: Duration::from_secs(10),
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
            pace: None,
        }
    }
}
