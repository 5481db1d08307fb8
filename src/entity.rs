//! # Monitored entities and their observed status.
//!
//! - [`EntityKey`] identifies one monitored entity (namespace + name).
//! - [`EntityStatus`] is the observed state reported by discovery (list of [`Endpoint`]s).
//! - [`StatusUpdate`] is the message a worker pushes onto the pool's update channel.
//!
//! ## Rules
//! - Keys compare **field-wise**: `("ab", "c")` and `("a", "bc")` are different entities.
//! - Status comparison is **structural** (`PartialEq`), endpoint order included.

use std::fmt;
use std::sync::Arc;

/// Unique identity of a monitored entity.
///
/// Used as the registry key of the [`Pool`](crate::Pool). Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    namespace: Arc<str>,
    name: Arc<str>,
}

impl EntityKey {
    /// Creates a key from namespace and name.
    pub fn new(namespace: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns the namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the name part.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Readiness of a single discovered endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EndpointState {
    /// Endpoint answers probes.
    Ready,
    /// Endpoint was discovered but is not serving.
    #[default]
    NotReady,
}

/// One discovered endpoint of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Address as reported by the discoverer (`host:port`, URL, ...).
    pub address: String,
    /// Readiness reported by the discoverer.
    pub state: EndpointState,
    /// Optional human-readable reason (e.g. last probe error).
    pub reason: Option<String>,
}

impl Endpoint {
    /// Creates a ready endpoint.
    pub fn ready(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: EndpointState::Ready,
            reason: None,
        }
    }

    /// Creates a not-ready endpoint with a reason.
    pub fn not_ready(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: EndpointState::NotReady,
            reason: Some(reason.into()),
        }
    }
}

/// Observed status of an entity.
///
/// `Default` is the "nothing known yet" status (no endpoints).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityStatus {
    /// Endpoints in the order the discoverer reported them.
    pub endpoints: Vec<Endpoint>,
}

impl EntityStatus {
    /// Creates a status from a list of endpoints.
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self { endpoints }
    }

    /// Number of endpoints in [`EndpointState::Ready`].
    pub fn ready_count(&self) -> usize {
        self.endpoints
            .iter()
            .filter(|e| e.state == EndpointState::Ready)
            .count()
    }
}

/// Snapshot of an entity's observed status, as published by a worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Entity the status belongs to.
    pub key: EntityKey,
    /// Observed status.
    pub status: EntityStatus,
}

impl StatusUpdate {
    /// Creates a new update.
    pub fn new(key: EntityKey, status: EntityStatus) -> Self {
        Self { key, status }
    }
}
