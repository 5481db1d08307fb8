//! Pacing policies.
//!
//! The pool does not rate-limit discovery. These types are the opt-in
//! extension point for pacing workers whose discoverer returns without
//! publishing anything (which would otherwise spin).
//!
//! ## Contents
//! - [`BackoffPolicy`] how idle delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid lockstep probing
//!
//! ## Quick wiring
//! ```text
//! PoolConfig { pace: Option<BackoffPolicy>, .. }
//!      └─► core::worker run loop:
//!           - productive cycle → idle counter reset, next cycle immediately
//!           - idle cycle       → sleep(pace.next(idle)) (cancellable), idle += 1
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
