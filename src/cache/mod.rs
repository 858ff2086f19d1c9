//! In-memory image cache
//!
//! [`Cache`] owns the served snapshot and the loop that keeps it fresh.
//! [`Cache::run`] performs a first refresh right away, fires the warm signal
//! once it completes, then refreshes again on every TTL tick until it is
//! cancelled or stopped. Reads never wait on a refresh.

pub mod refresh;
pub mod store;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Fuse, FusedFuture};
use log::{debug, info};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::{IdentityApi, InventoryApi};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::filter::{Filter, ImageRef};

pub use refresh::CycleOutcome;
pub use store::{CacheStore, Snapshot};

use refresh::Refresher;

/// Why [`Cache::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The token passed to `run` was cancelled.
    Cancelled,
    /// [`Cache::stop`] was called.
    Stopped,
}

type StopRequest = oneshot::Sender<()>;

/// A periodically refreshed image cache.
pub struct Cache {
    config: Arc<CacheConfig>,
    store: Arc<CacheStore>,
    refresher: Arc<Refresher>,
    running: AtomicBool,
    stop_tx: Mutex<Option<mpsc::Sender<StopRequest>>>,
    warmed: watch::Sender<bool>,
}

impl Cache {
    pub fn new(
        config: CacheConfig,
        identity: Arc<dyn IdentityApi>,
        inventory: Arc<dyn InventoryApi>,
    ) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(CacheStore::new(config.regions().to_vec()));
        let refresher = Arc::new(Refresher::new(
            identity,
            inventory,
            Arc::clone(&config),
            Arc::clone(&store),
        ));
        let (warmed, _) = watch::channel(false);

        Self {
            config,
            store,
            refresher,
            running: AtomicBool::new(false),
            stop_tx: Mutex::new(None),
            warmed,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Tag key used for lifecycle-state ranking.
    pub fn state_tag(&self) -> &str {
        self.config.state_tag()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether a refresh has ever completed.
    pub fn is_warmed(&self) -> bool {
        *self.warmed.borrow()
    }

    /// Wait until the first refresh completes. Returns immediately if one
    /// already has.
    pub async fn warmed(&self) {
        let mut rx = self.warmed.subscribe();
        // The sender lives as long as `self`, so this only ends once warmed.
        let _ = rx.wait_for(|warmed| *warmed).await;
    }

    /// Keep the cache refreshed until `ctx` is cancelled or [`stop`](Self::stop)
    /// is called.
    ///
    /// A cycle still in flight at that point is aborted and drained before
    /// this returns, and the snapshot it was building is discarded.
    pub async fn run(&self, ctx: CancellationToken) -> Result<Shutdown, CacheError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CacheError::AlreadyRunning);
        }
        let _guard = RunGuard(self);

        let (stop_tx, stop_rx) = mpsc::channel(1);
        *self.stop_tx.lock().unwrap_or_else(PoisonError::into_inner) = Some(stop_tx);

        info!(
            "Cache started accounts={} regions={} ttl={}s",
            self.config.owner_ids().len(),
            self.config.regions().len(),
            self.config.ttl().as_secs()
        );

        Ok(self.run_loop(ctx, stop_rx).await)
    }

    async fn run_loop(
        &self,
        ctx: CancellationToken,
        mut stop_rx: mpsc::Receiver<StopRequest>,
    ) -> Shutdown {
        let ttl = self.config.ttl();
        let mut ticker = tokio::time::interval_at(Instant::now() + ttl, ttl);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycle_token = ctx.child_token();
        let mut cycle = self.start_cycle(&cycle_token);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    drain(&mut cycle, &cycle_token).await;
                    info!("Cache cancelled");
                    return Shutdown::Cancelled;
                }
                Some(ack) = stop_rx.recv() => {
                    drain(&mut cycle, &cycle_token).await;
                    let _ = ack.send(());
                    info!("Cache stopped");
                    return Shutdown::Stopped;
                }
                outcome = &mut cycle, if !cycle.is_terminated() => {
                    if let CycleOutcome::Completed { .. } = outcome {
                        self.mark_warmed();
                    }
                }
                _ = ticker.tick() => {
                    if cycle.is_terminated() {
                        cycle_token = ctx.child_token();
                        cycle = self.start_cycle(&cycle_token);
                    } else {
                        debug!("Previous cache update still running, skipping tick");
                    }
                }
            }
        }
    }

    fn start_cycle(&self, token: &CancellationToken) -> Fuse<BoxFuture<'static, CycleOutcome>> {
        Arc::clone(&self.refresher)
            .run_cycle(token.clone())
            .boxed()
            .fuse()
    }

    fn mark_warmed(&self) {
        self.warmed.send_if_modified(|warmed| {
            if *warmed {
                false
            } else {
                info!("Cache warmed");
                *warmed = true;
                true
            }
        });
    }

    /// Ask a running cache to stop, and wait until it has.
    pub async fn stop(&self) -> Result<(), CacheError> {
        let stop_tx = self
            .stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CacheError::NotRunning)?;

        let (ack_tx, ack_rx) = oneshot::channel();
        if stop_tx.send(ack_tx).await.is_err() {
            return Err(CacheError::NotRunning);
        }
        // A dropped acknowledgement means the loop exited for another reason.
        let _ = ack_rx.await;
        Ok(())
    }

    /// Run a single refresh outside the TTL loop.
    pub async fn refresh(&self, ctx: CancellationToken) -> CycleOutcome {
        let outcome = Arc::clone(&self.refresher).run_cycle(ctx).await;
        if let CycleOutcome::Completed { .. } = outcome {
            self.mark_warmed();
        }
        outcome
    }

    /// All cached images in `region`.
    pub fn images(&self, region: &str) -> Result<Vec<ImageRef>, CacheError> {
        self.store.images_in_region(region)
    }

    /// Cached images in `region` that pass `filter`.
    pub fn filter_images(&self, region: &str, filter: &Filter) -> Result<Vec<ImageRef>, CacheError> {
        self.store.filtered_images(region, filter)
    }

    /// Regions this cache polls and answers for.
    pub fn regions(&self) -> &[String] {
        self.store.supported_regions()
    }

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }
}

/// Cancel the cycle in flight, if any, and wait for its tasks to finish.
async fn drain(cycle: &mut Fuse<BoxFuture<'static, CycleOutcome>>, token: &CancellationToken) {
    token.cancel();
    if !cycle.is_terminated() {
        cycle.await;
    }
}

/// Returns the cache to idle however `run` exits.
struct RunGuard<'a>(&'a Cache);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self
            .0
            .stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.0.running.store(false, Ordering::SeqCst);
    }
}
