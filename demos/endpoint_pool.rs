//! # Demo: endpoint_pool
//!
//! Watches three services, reconciles their endpoints into an in-memory
//! store and shows the pool reacting to changes at runtime.
//!
//! Demonstrates how to:
//! - Build a `Pool` with the built-in `LogWriter` subscriber.
//! - Register discoverers that report on every probe cycle.
//! - Replace a discoverer in place, remove one, and let the pool drop a
//!   worker whose entity was deleted from the store.
//! - Shut down with a grace period.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Pool::builder(cfg).with_subscriber(LogWriter).build(lifetime, store)
//!   ├─► add_or_update(api, db, cache)         → 3 workers, first writes
//!   ├─► add_or_update(api, new endpoints)      → Replaced, one more write
//!   ├─► store.delete(db)                       → next write NotFound → EntityGone
//!   ├─► remove_by_key("prod", "cache")         → WorkerRemoved
//!   └─► shutdown()                             → AllStoppedWithin
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example endpoint_pool
//! ```

use std::{sync::Arc, time::Duration};

use discoverpool::{
    BackoffPolicy, DiscoverFn, DiscovererRef, Endpoint, EntityKey, EntityStatus, LogWriter,
    MemoryStore, Pool, PoolConfig, UpdateSender,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Probe that reports `addrs` every `period` until cancelled.
fn probe(key: &EntityKey, addrs: &'static [&'static str], period: Duration) -> DiscovererRef {
    DiscoverFn::arc(Some(key.clone()), move |ctx: CancellationToken, tx: UpdateSender| async move {
        let endpoints = addrs.iter().map(|a| Endpoint::ready(*a)).collect();
        if tx.send(EntityStatus::new(endpoints)).await.is_err() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = ctx.cancelled() => {}
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let api = EntityKey::new("prod", "api");
    let db = EntityKey::new("prod", "db");
    let cache = EntityKey::new("prod", "cache");

    let store = Arc::new(MemoryStore::new());
    for key in [&api, &db, &cache] {
        store.insert(key.clone());
    }

    let cfg = PoolConfig {
        grace: Duration::from_secs(5),
        update_capacity: 64,
        pace: Some(BackoffPolicy::constant(Duration::from_millis(200))),
        ..PoolConfig::default()
    };

    let lifetime = CancellationToken::new();
    let pool = Pool::builder(cfg)
        .with_subscriber(Arc::new(LogWriter))
        .build(&lifetime, store.clone());

    let period = Duration::from_millis(100);
    pool.add_or_update(probe(&api, &["10.0.0.1:8080"], period));
    pool.add_or_update(probe(&db, &["10.0.1.1:5432", "10.0.1.2:5432"], period));
    pool.add_or_update(probe(&cache, &["10.0.2.1:6379"], period));
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("after start: {} entities, {} writes", pool.size(), store.writes());

    // Same key: the running worker picks up the new probe on its next cycle.
    pool.add_or_update(probe(&api, &["10.0.0.1:8080", "10.0.0.2:8080"], period));
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("api now: {:?}", store.status(&api));

    // Deleted upstream: the next write reports NotFound and the pool drops the worker.
    store.delete(&db);
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("after db deletion: keys = {:?}", pool.keys());

    pool.remove_by_key("prod", "cache");
    println!("after cache removal: {} entities", pool.size());

    pool.shutdown().await?;
    println!("shut down, {} writes total", store.writes());
    Ok(())
}
