//! # Jitter policy for pacing delays.
//!
//! [`JitterPolicy`] randomizes idle delays so that workers which went idle at
//! the same moment (e.g. after a store outage) do not probe in lockstep.
//!
//! - [`JitterPolicy::None`] exact delay
//! - [`JitterPolicy::Full`] random in `[0, delay]`
//! - [`JitterPolicy::Equal`] `delay/2 + random[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`] random in `[base, prev * 3]`, capped at max

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of pacing delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use exact delay.
    #[default]
    None,
    /// Full jitter: random delay in `[0, delay]`.
    Full,
    /// Equal jitter: `delay/2 + random[0, delay/2]`.
    Equal,
    /// Decorrelated jitter: random in `[base, prev * 3]`, capped at max.
    ///
    /// Needs context, see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    ///
    /// `Decorrelated` returns the input unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }

    /// Applies decorrelated jitter with full context.
    ///
    /// On any other policy, falls back to `apply(prev)`.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let base_ms = saturating_ms(base);
        let upper = saturating_ms(prev)
            .saturating_mul(3)
            .min(saturating_ms(max))
            .max(base_ms);

        if base_ms >= upper {
            return base;
        }
        Duration::from_millis(rand::rng().random_range(base_ms..=upper))
    }
}

fn saturating_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn full_jitter(delay: Duration) -> Duration {
    let ms = saturating_ms(delay);
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal_jitter(delay: Duration) -> Duration {
    let half = saturating_ms(delay) / 2;
    if half == 0 {
        return delay;
    }
    Duration::from_millis(half + rand::rng().random_range(0..=half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn test_full_within_bounds() {
        let d = Duration::from_millis(400);
        for _ in 0..100 {
            assert!(JitterPolicy::Full.apply(d) <= d);
        }
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_equal_keeps_lower_half() {
        let d = Duration::from_millis(400);
        for _ in 0..100 {
            let j = JitterPolicy::Equal.apply(d);
            assert!(j >= Duration::from_millis(200) && j <= d);
        }
    }

    #[test]
    fn test_millisecond_overflow_saturates() {
        let cap = Duration::from_millis(u64::MAX);
        assert!(JitterPolicy::Full.apply(Duration::MAX) <= cap);
        assert!(JitterPolicy::Equal.apply(Duration::MAX) <= cap);
        let d = JitterPolicy::Decorrelated.apply_decorrelated(Duration::from_secs(1), Duration::MAX, Duration::MAX);
        assert!(d >= Duration::from_secs(1) && d <= cap);
    }

    #[test]
    fn test_decorrelated_fallback_on_other_policy() {
        let prev = Duration::from_millis(70);
        let got = JitterPolicy::None.apply_decorrelated(Duration::from_millis(10), prev, Duration::from_secs(1));
        assert_eq!(got, prev);
    }
}
