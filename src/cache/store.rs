//! Snapshot storage
//!
//! The current [`Snapshot`] sits behind a reader/writer lock as an `Arc`.
//! Readers clone the `Arc` and release the lock immediately; a refresh builds
//! its replacement without holding the lock and only takes the write lock to
//! swap the pointer.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::CacheError;
use crate::filter::{Filter, ImageRef};
use crate::image::Image;

/// A complete, internally consistent set of image records.
#[derive(Debug, Default)]
pub struct Snapshot {
    by_id: HashMap<String, ImageRef>,
    ids_by_region: HashMap<String, Vec<String>>,
}

impl Snapshot {
    /// Number of distinct images.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ImageRef> {
        self.by_id.get(id)
    }

    /// Images indexed under `region`, in index order.
    pub fn images_in(&self, region: &str) -> Vec<ImageRef> {
        self.ids_by_region
            .get(region)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Accumulates one refresh cycle's results before they become a [`Snapshot`].
#[derive(Debug, Default)]
pub(crate) struct SnapshotBuilder {
    by_id: HashMap<String, ImageRef>,
    ids_by_region: HashMap<String, Vec<String>>,
    indexed: HashMap<String, HashSet<String>>,
}

impl SnapshotBuilder {
    /// Add a batch of images listed in `region`. An id seen before takes the
    /// newer record; each region indexes an id at most once.
    pub(crate) fn extend(&mut self, region: &str, images: Vec<Image>) {
        let index = self.ids_by_region.entry(region.to_string()).or_default();
        let seen = self.indexed.entry(region.to_string()).or_default();
        for image in images {
            let id = image.id().to_string();
            if seen.insert(id.clone()) {
                index.push(id.clone());
            }
            self.by_id.insert(id, Arc::new(image));
        }
    }

    pub(crate) fn build(self) -> Snapshot {
        Snapshot {
            by_id: self.by_id,
            ids_by_region: self.ids_by_region,
        }
    }
}

/// Holds the snapshot currently served to readers.
#[derive(Debug)]
pub struct CacheStore {
    regions: Vec<String>,
    current: RwLock<Arc<Snapshot>>,
}

impl CacheStore {
    /// Create an empty store serving `regions`.
    pub fn new(regions: Vec<String>) -> Self {
        Self {
            regions,
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Regions this store answers for.
    pub fn supported_regions(&self) -> &[String] {
        &self.regions
    }

    pub fn is_supported(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    /// The snapshot currently being served.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All cached images in `region`.
    ///
    /// Fails for regions outside the supported set, even when nothing is
    /// cached; a supported region with no images yields an empty list.
    pub fn images_in_region(&self, region: &str) -> Result<Vec<ImageRef>, CacheError> {
        if !self.is_supported(region) {
            return Err(CacheError::UnsupportedRegion(region.to_string()));
        }
        Ok(self.snapshot().images_in(region))
    }

    /// Cached images in `region` that pass `filter`.
    pub fn filtered_images(
        &self,
        region: &str,
        filter: &Filter,
    ) -> Result<Vec<ImageRef>, CacheError> {
        self.images_in_region(region).map(|images| filter.apply(images))
    }

    /// Make `snapshot` the one served to readers.
    pub(crate) fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}
