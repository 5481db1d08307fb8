//! # Worker: one discoverer in a cancellable loop.
//!
//! A [`Worker`] owns the current [`Discoverer`](crate::Discoverer) of one entity
//! and runs it over and over until its run token is cancelled.
//!
//! ## Architecture
//! ```text
//! Registry ──► Worker::start() ──► tokio::spawn(run_loop)
//!
//! loop {
//!   ├─► exit if run token cancelled
//!   ├─► d = current discoverer        (swaps land here)
//!   ├─► d.discover(token, sender)     (panic → WorkerPanicked, exit)
//!   ├─► exit if run token cancelled
//!   └─► pacing (optional):
//!         ├─ cycle published something → idle = 0
//!         └─ cycle published nothing   → IdleBackoff, sleep(pace.next(idle)), idle += 1
//! }
//! ```
//!
//! ## Rules
//! - One run loop per worker at a time: `running` is set by `start()` before the
//!   loop is spawned and cleared only when the loop exits.
//! - Every start gets a **fresh** child token and a new generation; the
//!   [`UpdateSender`] of an old run refuses to publish once its token is cancelled.
//! - `update_discoverer` never interrupts an in-flight `discover` call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{select, sync::mpsc, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::discovery::{DiscovererRef, UpdateSender};
use crate::entity::{EntityKey, StatusUpdate};
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::subscribers::panic_message;

/// Shared handle to a worker, as returned by [`Pool::worker`](crate::Pool::worker).
pub type WorkerHandle = Arc<Worker>;

/// What every run loop needs from the pool.
#[derive(Clone)]
pub(crate) struct RunContext {
    pub bus: Bus,
    pub updates: mpsc::Sender<StatusUpdate>,
    pub pace: Option<BackoffPolicy>,
}

/// One discovery task of one entity.
pub struct Worker {
    key: EntityKey,
    discoverer: Mutex<DiscovererRef>,
    run: Mutex<CancellationToken>,
    running: AtomicBool,
    generation: AtomicU64,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("key", &self.key)
            .field("running", &!self.is_stopped())
            .field("generation", &self.generation())
            .finish()
    }
}

impl Worker {
    /// Creates a worker in the `Created` state (not running).
    pub(crate) fn new(key: EntityKey, discoverer: DiscovererRef) -> Arc<Self> {
        let run = CancellationToken::new();
        run.cancel();
        Arc::new(Self {
            key,
            discoverer: Mutex::new(discoverer),
            run: Mutex::new(run),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        })
    }

    /// Entity this worker discovers.
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// Currently active discoverer.
    pub fn discoverer(&self) -> DiscovererRef {
        Arc::clone(&self.discoverer.lock())
    }

    /// Number of times the run loop has been started (0 = never).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replaces the discoverer; the next loop iteration uses it.
    pub fn update_discoverer(&self, discoverer: DiscovererRef) {
        *self.discoverer.lock() = discoverer;
    }

    /// Requests cooperative cancellation of the current run. Does not wait.
    pub fn stop(&self) {
        self.run.lock().cancel();
    }

    /// Returns `true` if no run loop is active.
    ///
    /// Advisory: a loop that was just told to stop reports `false` until it
    /// actually exits.
    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }

    /// Starts a new run under `parent`. Caller must hold the registry lock
    /// and have checked [`is_stopped`](Self::is_stopped).
    pub(crate) fn start(self: &Arc<Self>, parent: &CancellationToken, ctx: &RunContext) -> JoinHandle<()> {
        let token = parent.child_token();
        *self.run.lock() = token.clone();
        self.running.store(true, Ordering::Release);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let me = Arc::clone(self);
        let ctx = ctx.clone();
        tokio::spawn(async move { me.run_loop(token, generation, ctx).await })
    }

    async fn run_loop(self: Arc<Self>, token: CancellationToken, generation: u64, ctx: RunContext) {
        let running = RunningGuard(&self.running);
        ctx.bus.publish(
            Event::new(EventKind::WorkerStarting)
                .with_key(&self.key)
                .with_generation(generation),
        );

        let mut idle: u32 = 0;
        loop {
            if token.is_cancelled() {
                break;
            }
            let discoverer = self.discoverer();
            let sender = UpdateSender::new(self.key.clone(), ctx.updates.clone(), token.clone());

            let cycle = std::panic::AssertUnwindSafe(discoverer.discover(token.clone(), sender.clone()))
                .catch_unwind()
                .await;
            if let Err(panic_err) = cycle {
                ctx.bus.publish(
                    Event::new(EventKind::WorkerPanicked)
                        .with_key(&self.key)
                        .with_generation(generation)
                        .with_reason(panic_message(&*panic_err)),
                );
                break;
            }
            if token.is_cancelled() {
                break;
            }

            match ctx.pace {
                Some(pace) if sender.published() == 0 => {
                    let delay = pace.next(idle);
                    idle = idle.saturating_add(1);
                    ctx.bus.publish(
                        Event::new(EventKind::IdleBackoff)
                            .with_key(&self.key)
                            .with_generation(generation)
                            .with_delay(delay),
                    );
                    select! {
                        _ = time::sleep(delay) => {}
                        _ = token.cancelled() => break,
                    }
                }
                Some(_) => idle = 0,
                // A discoverer that returns at once must not monopolize the runtime.
                None => tokio::task::yield_now().await,
            }
        }

        drop(running);
        ctx.bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_key(&self.key)
                .with_generation(generation),
        );
    }
}

/// Clears the `running` flag when the run loop ends, including by abort.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoverFn;
    use crate::entity::{Endpoint, EntityStatus};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn ctx(cap: usize, pace: Option<BackoffPolicy>) -> (RunContext, mpsc::Receiver<StatusUpdate>) {
        let (tx, rx) = mpsc::channel(cap);
        (
            RunContext {
                bus: Bus::new(64),
                updates: tx,
                pace,
            },
            rx,
        )
    }

    fn key() -> EntityKey {
        EntityKey::new("ns", "a")
    }

    fn reporting(addr: &'static str) -> DiscovererRef {
        DiscoverFn::arc(Some(key()), move |ctx: CancellationToken, tx: UpdateSender| async move {
            let _ = tx.send(EntityStatus::new(vec![Endpoint::ready(addr)])).await;
            ctx.cancelled().await;
        })
    }

    async fn wait_stopped(w: &Worker) {
        time::timeout(Duration::from_secs(5), async {
            while !w.is_stopped() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("worker did not stop");
    }

    #[tokio::test]
    async fn test_new_worker_is_stopped_until_started() {
        let w = Worker::new(key(), reporting("e1"));
        assert!(w.is_stopped());
        assert_eq!(w.generation(), 0);
    }

    #[tokio::test]
    async fn test_start_publishes_and_stop_exits() {
        let (ctx, mut rx) = ctx(4, None);
        let parent = CancellationToken::new();
        let w = Worker::new(key(), reporting("e1"));

        let join = w.start(&parent, &ctx);
        assert!(!w.is_stopped());
        assert_eq!(w.generation(), 1);

        let update = rx.recv().await.expect("update");
        assert_eq!(update.key, key());
        assert_eq!(update.status, EntityStatus::new(vec![Endpoint::ready("e1")]));

        w.stop();
        join.await.expect("join");
        assert!(w.is_stopped());
    }

    #[tokio::test]
    async fn test_swapped_discoverer_used_on_next_cycle() {
        let (ctx, mut rx) = ctx(4, None);
        let parent = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        // First discoverer: reports e1, then returns after a short wait.
        let first: DiscovererRef = DiscoverFn::arc(Some(key()), {
            let calls = calls.clone();
            move |_ctx: CancellationToken, tx: UpdateSender| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(EntityStatus::new(vec![Endpoint::ready("e1")])).await;
                    time::sleep(Duration::from_millis(50)).await;
                }
            }
        });
        let w = Worker::new(key(), first);
        let join = w.start(&parent, &ctx);

        assert_eq!(rx.recv().await.expect("e1").status.endpoints[0].address, "e1");
        w.update_discoverer(reporting("e2"));

        // The in-flight cycle of `first` finishes; the next cycle reports e2.
        loop {
            let update = rx.recv().await.expect("update");
            if update.status.endpoints[0].address == "e2" {
                break;
            }
        }
        w.stop();
        join.await.expect("join");
    }

    #[tokio::test]
    async fn test_panicking_discoverer_stops_worker() {
        let (ctx, _rx) = ctx(4, None);
        let mut events = ctx.bus.subscribe();
        let parent = CancellationToken::new();
        fn explode() {
            panic!("probe blew up")
        }
        let boom: DiscovererRef =
            DiscoverFn::arc(Some(key()), |_ctx: CancellationToken, _tx: UpdateSender| async move {
                explode()
            });
        let w = Worker::new(key(), boom);
        w.start(&parent, &ctx).await.expect("loop exits normally");
        assert!(w.is_stopped());

        let mut saw_panic = false;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::WorkerPanicked {
                assert_eq!(ev.reason.as_deref(), Some("probe blew up"));
                saw_panic = true;
            }
        }
        assert!(saw_panic);
    }

    #[tokio::test]
    async fn test_restart_uses_fresh_token_and_generation() {
        let (ctx, mut rx) = ctx(4, None);
        let parent = CancellationToken::new();
        let w = Worker::new(key(), reporting("e1"));

        w.start(&parent, &ctx);
        rx.recv().await.expect("first run");
        w.stop();
        wait_stopped(&w).await;

        w.start(&parent, &ctx);
        assert_eq!(w.generation(), 2);
        assert!(!w.is_stopped());
        rx.recv().await.expect("second run publishes");
        w.stop();
        wait_stopped(&w).await;
    }

    #[tokio::test]
    async fn test_parent_cancel_stops_run() {
        let (ctx, _rx) = ctx(4, None);
        let parent = CancellationToken::new();
        let w = Worker::new(key(), reporting("e1"));
        let join = w.start(&parent, &ctx);

        parent.cancel();
        join.await.expect("join");
        assert!(w.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_cycles_are_paced() {
        let (ctx, _rx) = ctx(4, Some(BackoffPolicy::constant(Duration::from_millis(100))));
        let parent = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let idle: DiscovererRef = DiscoverFn::arc(Some(key()), {
            let calls = calls.clone();
            move |_ctx: CancellationToken, _tx: UpdateSender| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
        let w = Worker::new(key(), idle);
        w.start(&parent, &ctx);

        time::sleep(Duration::from_millis(950)).await;
        let n = calls.load(Ordering::SeqCst);
        assert!((9..=11).contains(&n), "expected ~10 paced cycles, got {n}");

        w.stop();
        wait_stopped(&w).await;
    }
}
