//! # Backoff policy for idle discovery cycles.
//!
//! [`BackoffPolicy`] controls how long a worker waits after consecutive
//! discovery cycles that published nothing. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay after the first idle cycle;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay after `n` consecutive idle cycles (0-indexed) is `first × factor^n`,
//! clamped to `max`, then jitter is applied. The base is derived from `n` alone,
//! so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use discoverpool::{BackoffPolicy, JitterPolicy};
//!
//! let pace = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(5),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(pace.next(0), Duration::from_millis(250));
//! assert_eq!(pace.next(2), Duration::from_secs(1));
//! assert_eq!(pace.next(8), Duration::from_secs(5));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Idle-cycle backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first idle cycle.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy, spreads out workers that went idle together.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 1s`;
    /// - `factor = 2.0`;
    /// - `max = 30s`;
    /// - `jitter = Equal`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay `d` after every idle cycle, no jitter.
    pub fn constant(d: Duration) -> Self {
        Self {
            first: d,
            max: d,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay after `idle` consecutive idle cycles (0-indexed).
    ///
    /// Non-finite or negative intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, idle: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = idle.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::try_from_secs_f64(unclamped_secs).unwrap_or(self.max)
            };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}
