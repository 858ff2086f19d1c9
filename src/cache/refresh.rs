//! Refresh cycles
//!
//! One cycle fans out as a task tree: a task per owner account assumes the
//! role once, then spawns a task per region that lists images and, when
//! enabled, looks up launch permissions through a bounded pool. Results
//! accumulate in a builder private to the cycle and are swapped into the
//! store only after every task has finished.
//!
//! Failures stay inside their branch. A denied role empties that account, a
//! failed listing empties that region, and a failed permission lookup leaves
//! that image with no grants.

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::store::{CacheStore, SnapshotBuilder};
use crate::client::{
    AssumeRoleRequest, Credentials, IdentityApi, ImageDescriptor, InventoryApi,
    ListImagesRequest, RequestLimiter, pool_size, run_bounded,
};
use crate::config::CacheConfig;
use crate::image::Image;

/// Share of a region's images looked up concurrently, before capping.
const POOL_PERCENT: f64 = 0.05;

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every branch finished and the new snapshot is being served.
    Completed { images: usize },
    /// Cancelled before finishing. The served snapshot is unchanged.
    Cancelled,
}

type SharedBuilder = Arc<Mutex<SnapshotBuilder>>;

/// Runs refresh cycles against the upstream services.
pub(crate) struct Refresher {
    identity: Arc<dyn IdentityApi>,
    inventory: Arc<dyn InventoryApi>,
    config: Arc<CacheConfig>,
    store: Arc<CacheStore>,
}

impl Refresher {
    pub(crate) fn new(
        identity: Arc<dyn IdentityApi>,
        inventory: Arc<dyn InventoryApi>,
        config: Arc<CacheConfig>,
        store: Arc<CacheStore>,
    ) -> Self {
        Self {
            identity,
            inventory,
            config,
            store,
        }
    }

    /// Run one cycle to completion or cancellation.
    ///
    /// On cancellation each account task aborts and awaits its region tasks,
    /// and this waits for every account task, so nothing from the cycle
    /// outlives it.
    pub(crate) async fn run_cycle(self: Arc<Self>, cancel: CancellationToken) -> CycleOutcome {
        let builder: SharedBuilder = Arc::default();
        let mut accounts = JoinSet::new();

        debug!(
            "Starting cache update accounts={} regions={}",
            self.config.owner_ids().len(),
            self.config.regions().len()
        );

        for owner in self.config.owner_ids() {
            accounts.spawn(Arc::clone(&self).refresh_account(
                owner.clone(),
                Arc::clone(&builder),
                cancel.clone(),
            ));
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Account tasks see the same token and shut down their regions.
                    while accounts.join_next().await.is_some() {}
                    info!("Cache update cancelled");
                    return CycleOutcome::Cancelled;
                }
                joined = accounts.join_next() => match joined {
                    Some(Err(err)) if err.is_panic() => {
                        warn!("Account refresh task panicked: {}", err);
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }

        let snapshot = std::mem::take(&mut *builder.lock().unwrap_or_else(PoisonError::into_inner))
            .build();
        let images = snapshot.len();
        self.store.replace(snapshot);

        info!("Cache updated images={}", images);
        CycleOutcome::Completed { images }
    }

    async fn refresh_account(
        self: Arc<Self>,
        owner: String,
        builder: SharedBuilder,
        cancel: CancellationToken,
    ) {
        let request = AssumeRoleRequest::for_account(&owner, self.config.role_name());
        let assumed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            assumed = self.identity.assume_role(&request) => assumed,
        };
        let credentials = match assumed {
            Ok(credentials) => Arc::new(credentials),
            Err(err) => {
                warn!("Skipping account owner_id={} error={}", owner, err);
                return;
            }
        };

        let limiter = self
            .config
            .max_requests_per_second()
            .map(|rate| Arc::new(RequestLimiter::new(&owner, rate)));

        let mut regions = JoinSet::new();
        for region in self.config.regions() {
            regions.spawn(Arc::clone(&self).refresh_region(
                owner.clone(),
                region.clone(),
                Arc::clone(&credentials),
                limiter.clone(),
                Arc::clone(&builder),
            ));
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    regions.shutdown().await;
                    debug!("Account refresh cancelled owner_id={}", owner);
                    return;
                }
                joined = regions.join_next() => match joined {
                    Some(Err(err)) if err.is_panic() => {
                        warn!("Region refresh task panicked owner_id={} error={}", owner, err);
                    }
                    Some(_) => {}
                    None => return,
                },
            }
        }
    }

    async fn refresh_region(
        self: Arc<Self>,
        owner: String,
        region: String,
        credentials: Arc<Credentials>,
        limiter: Option<Arc<RequestLimiter>>,
        builder: SharedBuilder,
    ) {
        let request = ListImagesRequest::new(&region, &owner, self.config.tag_filter());
        let descriptors = match self.inventory.list_images(&credentials, &request).await {
            Ok(descriptors) => descriptors,
            Err(err) => {
                warn!(
                    "Failed to list images owner_id={} region={} error={}",
                    owner, region, err
                );
                return;
            }
        };

        let images = if self.config.collect_visibility() {
            self.enrich(&owner, &region, &credentials, limiter.as_deref(), descriptors)
                .await
        } else {
            descriptors
                .into_iter()
                .map(|descriptor| Image::new(descriptor, owner.as_str(), region.as_str(), Vec::new()))
                .collect()
        };

        let count = images.len();
        builder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(&region, images);

        info!("Cached images owner_id={} region={} count={}", owner, region, count);
    }

    /// Look up launch permissions for every image, a bounded number at a time.
    async fn enrich(
        &self,
        owner: &str,
        region: &str,
        credentials: &Credentials,
        limiter: Option<&RequestLimiter>,
        descriptors: Vec<ImageDescriptor>,
    ) -> Vec<Image> {
        let workers = pool_size(
            self.config.max_concurrent_requests(),
            descriptors.len(),
            POOL_PERCENT,
        );
        debug!(
            "Collecting launch permissions owner_id={} region={} images={} workers={}",
            owner,
            region,
            descriptors.len(),
            workers
        );

        run_bounded(
            descriptors,
            |descriptor| async move {
                if let Some(limiter) = limiter {
                    limiter.until_ready().await;
                }

                let grants = match self
                    .inventory
                    .describe_visibility(credentials, region, &descriptor.image_id)
                    .await
                {
                    Ok(grants) => grants,
                    Err(err) => {
                        warn!(
                            "Failed to get launch permissions owner_id={} region={} image_id={} error={}",
                            owner, region, descriptor.image_id, err
                        );
                        Vec::new()
                    }
                };

                Image::new(descriptor, owner, region, grants)
            },
            workers,
        )
        .await
    }
}
