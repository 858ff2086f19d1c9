//! Validated cache settings
//!
//! [`CacheConfig`] is checked once at construction; the cache never sees an
//! invalid value.

use std::time::Duration;

use log::info;

use super::regions::{default_regions, is_known_region};
use crate::error::ConfigError;
use crate::image::DEFAULT_STATE_TAG;

/// Shortest refresh interval accepted.
pub const MIN_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Refresh interval used when none is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Default cap on concurrent launch-permission lookups per region.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 15;

/// Settings for one [`Cache`](crate::cache::Cache).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    role_name: String,
    owner_ids: Vec<String>,
    regions: Vec<String>,
    tag_filter: Option<String>,
    state_tag: String,
    ttl: Duration,
    max_concurrent_requests: usize,
    collect_visibility: bool,
    max_requests_per_second: Option<f64>,
}

impl CacheConfig {
    /// Settings for `owner_ids`, assuming `role_name` in each. Everything
    /// else starts at its default.
    pub fn new<I, S>(role_name: impl Into<String>, owner_ids: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let role_name = role_name.into();
        if role_name.trim().is_empty() {
            return Err(ConfigError::MissingRoleName);
        }

        let mut owners: Vec<String> = Vec::new();
        for owner in owner_ids.into_iter().map(Into::into) {
            let owner = owner.trim().to_string();
            if !owner.is_empty() && !owners.contains(&owner) {
                owners.push(owner);
            }
        }
        if owners.is_empty() {
            return Err(ConfigError::MissingOwnerIds);
        }

        Ok(Self {
            role_name,
            owner_ids: owners,
            regions: default_regions(),
            tag_filter: None,
            state_tag: DEFAULT_STATE_TAG.to_string(),
            ttl: DEFAULT_CACHE_TTL,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            collect_visibility: true,
            max_requests_per_second: None,
        })
    }

    /// Poll only `regions`. An empty list keeps every default region.
    pub fn with_regions<I, S>(mut self, regions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = Vec::new();
        for region in regions.into_iter().map(Into::into) {
            let region = region.trim().to_string();
            if region.is_empty() || selected.contains(&region) {
                continue;
            }
            if !is_known_region(&region) {
                return Err(ConfigError::UnsupportedRegion(region));
            }
            selected.push(region);
        }

        self.regions = if selected.is_empty() {
            default_regions()
        } else {
            selected
        };
        Ok(self)
    }

    /// Only list images carrying this tag key.
    pub fn with_tag_filter(mut self, tag_key: Option<String>) -> Self {
        self.tag_filter = tag_key.filter(|key| !key.trim().is_empty());
        self
    }

    /// Tag key holding the lifecycle state used for ranking.
    pub fn with_state_tag(mut self, state_tag: Option<String>) -> Self {
        self.state_tag = state_tag
            .filter(|tag| !tag.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATE_TAG.to_string());
        self
    }

    /// Refresh interval. Values below [`MIN_CACHE_TTL`] are raised to it.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        if ttl < MIN_CACHE_TTL {
            info!(
                "Cache TTL {}s is below the minimum, using {}s",
                ttl.as_secs(),
                MIN_CACHE_TTL.as_secs()
            );
            self.ttl = MIN_CACHE_TTL;
        } else {
            self.ttl = ttl;
        }
        self
    }

    /// Cap on concurrent launch-permission lookups per region.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Result<Self, ConfigError> {
        if max == 0 {
            return Err(ConfigError::Invalid(
                "max concurrent requests must be at least 1".to_string(),
            ));
        }
        self.max_concurrent_requests = max;
        Ok(self)
    }

    /// Whether launch permissions are looked up for every image.
    pub fn with_collect_visibility(mut self, collect: bool) -> Self {
        self.collect_visibility = collect;
        self
    }

    /// Pace launch-permission lookups to `rate` requests per second per account.
    pub fn with_max_requests_per_second(mut self, rate: Option<f64>) -> Result<Self, ConfigError> {
        if let Some(rate) = rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "max requests per second must be positive, got {}",
                    rate
                )));
            }
        }
        self.max_requests_per_second = rate;
        Ok(self)
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn owner_ids(&self) -> &[String] {
        &self.owner_ids
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    pub fn state_tag(&self) -> &str {
        &self.state_tag
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    pub fn collect_visibility(&self) -> bool {
        self.collect_visibility
    }

    pub fn max_requests_per_second(&self) -> Option<f64> {
        self.max_requests_per_second
    }

    /// Shorten the refresh interval past the floor. Test-only.
    #[cfg(test)]
    pub(crate) fn with_ttl_unchecked(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}
