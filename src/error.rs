//! Error types used by the pool runtime and its collaborators.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`] - errors raised by the pool runtime itself.
//! - [`StoreError`] - errors returned by a [`StateStore`](crate::StateStore).
//! - [`SendError`] - errors returned when a worker publishes an update.
//!
//! All types provide `as_label` for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::entity::EntityKey;

/// # Errors produced by the pool runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some workers were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Entities whose workers did not stop in time.
        stuck: Vec<EntityKey>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use discoverpool::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                let keys: Vec<String> = stuck.iter().map(ToString::to_string).collect();
                format!("grace exceeded after {grace:?}; stuck workers={keys:?}")
            }
        }
    }
}

/// # Errors produced by a state store.
///
/// [`StoreError::NotFound`] is the distinguished kind: returned from a status
/// write it means the entity was deleted, and the pool drops its worker.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The entity does not exist in the store.
    #[error("entity {key} not found")]
    NotFound {
        /// Entity that was looked up.
        key: EntityKey,
    },

    /// The store could not be reached or failed internally.
    #[error("store unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },

    /// The write lost a race with a concurrent writer.
    #[error("write conflict: {error}")]
    Conflict {
        /// The underlying error message.
        error: String,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use discoverpool::{EntityKey, StoreError};
    ///
    /// let err = StoreError::NotFound { key: EntityKey::new("ns", "a") };
    /// assert_eq!(err.as_label(), "store_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "store_not_found",
            StoreError::Unavailable { .. } => "store_unavailable",
            StoreError::Conflict { .. } => "store_conflict",
        }
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Indicates whether a later attempt may succeed.
    ///
    /// The pool itself never retries; this is for stores and subscribers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Conflict { .. }
        )
    }
}

/// # Errors returned by [`UpdateSender::send`](crate::UpdateSender::send).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The publishing run was cancelled (worker stopped, removed or pool shut down).
    #[error("worker run cancelled")]
    Cancelled,

    /// The reconcile loop is gone; nobody will consume the update.
    #[error("update channel closed")]
    Closed,
}

impl SendError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SendError::Cancelled => "send_cancelled",
            SendError::Closed => "send_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        let nf = StoreError::NotFound {
            key: EntityKey::new("ns", "a"),
        };
        assert!(nf.is_not_found());
        assert!(!nf.is_retryable());

        let down = StoreError::Unavailable {
            error: "connection refused".into(),
        };
        assert!(!down.is_not_found());
        assert!(down.is_retryable());
        assert_eq!(down.to_string(), "store unavailable: connection refused");
    }

    #[test]
    fn test_grace_exceeded_message_lists_keys() {
        let err = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec![EntityKey::new("ns", "a")],
        };
        assert!(err.as_message().contains("ns/a"));
    }
}
