//! Runtime core: workers, registry and the reconcile loop.
//!
//! The public entry point is [`Pool`]; everything else here is either a
//! handle type it returns or internal machinery.
//!
//! Internal modules:
//! - [`worker`]: one discovery run loop per entity, restartable with a fresh token;
//! - [`registry`]: the keyed worker map behind a single lock;
//! - [`reconcile`]: turns one status update into at most one store write;
//! - [`pool`]: owns the update channel, the reconcile loop and shutdown;
//! - [`builder`]: wires config, bus and subscribers into a pool.

mod builder;
mod config;
mod pool;
mod reconcile;
mod registry;
mod worker;

pub use builder::PoolBuilder;
pub use config::PoolConfig;
pub use pool::Pool;
pub use registry::AddOutcome;
pub use worker::{Worker, WorkerHandle};
