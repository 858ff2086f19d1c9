//! Mock upstream services for testing
//!
//! Implements both [`IdentityApi`] and [`InventoryApi`] from in-memory data so
//! the refresh engine can be exercised without network calls.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::UpstreamResult;
use super::api::{IdentityApi, InventoryApi};
use super::models::{AssumeRoleRequest, Credentials, ImageDescriptor, ListImagesRequest};
use crate::error::UpstreamError;

/// Mock identity + inventory services.
///
/// Configure data and failures via builder methods, then share it with a
/// cache as both collaborators.
///
/// # Example
/// ```ignore
/// let mock = MockCloud::new()
///     .with_images("111122223333", "us-west-2", vec![descriptor("ami-1", "available")])
///     .with_grants("ami-1", &["444455556666"]);
/// ```
#[derive(Default)]
pub struct MockCloud {
    /// Images returned per (owner, region)
    images: Arc<Mutex<HashMap<(String, String), Vec<ImageDescriptor>>>>,
    /// Launch permissions per image id
    grants: HashMap<String, Vec<String>>,
    /// Accounts whose role assumption fails
    denied_accounts: HashSet<String>,
    /// (owner, region) pairs whose listing fails
    failing_listings: HashSet<(String, String)>,
    /// Images whose launch-permission lookup fails
    failing_grants: HashSet<String>,
    /// Delay applied to every listing call
    list_delay: Arc<Mutex<Option<Duration>>>,
    /// Delay applied to every launch-permission lookup
    grant_delay: Option<Duration>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Captured listing requests for test assertions
    captured_requests: Arc<Mutex<Vec<ListImagesRequest>>>,
}

/// Tracks upstream call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub assume_role: usize,
    pub list_images: usize,
    pub describe_visibility: usize,
    /// Peak number of concurrent launch-permission lookups
    pub max_concurrent_visibility: usize,
    in_flight_visibility: usize,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Images listed for `owner` in `region`.
    pub fn with_images(self, owner: &str, region: &str, images: Vec<ImageDescriptor>) -> Self {
        if let Ok(mut map) = self.images.try_lock() {
            map.insert((owner.to_string(), region.to_string()), images);
        }
        self
    }

    /// Launch permissions for `image_id`.
    pub fn with_grants(mut self, image_id: &str, accounts: &[&str]) -> Self {
        self.grants.insert(
            image_id.to_string(),
            accounts.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Make role assumption fail for `account`.
    pub fn deny_account(mut self, account: &str) -> Self {
        self.denied_accounts.insert(account.to_string());
        self
    }

    /// Make listing fail for `owner` in `region`.
    pub fn fail_listing(mut self, owner: &str, region: &str) -> Self {
        self.failing_listings
            .insert((owner.to_string(), region.to_string()));
        self
    }

    /// Make the launch-permission lookup fail for `image_id`.
    pub fn fail_grants(mut self, image_id: &str) -> Self {
        self.failing_grants.insert(image_id.to_string());
        self
    }

    /// Delay every listing call by `delay`.
    pub fn list_delay(self, delay: Duration) -> Self {
        if let Ok(mut current) = self.list_delay.try_lock() {
            *current = Some(delay);
        }
        self
    }

    /// Delay every launch-permission lookup by `delay`.
    pub fn grant_delay(mut self, delay: Duration) -> Self {
        self.grant_delay = Some(delay);
        self
    }

    /// Replace the images listed for `owner` in `region` after construction.
    pub async fn set_images(&self, owner: &str, region: &str, images: Vec<ImageDescriptor>) {
        self.images
            .lock()
            .await
            .insert((owner.to_string(), region.to_string()), images);
    }

    /// Change the listing delay after construction.
    pub async fn set_list_delay(&self, delay: Option<Duration>) {
        *self.list_delay.lock().await = delay;
    }

    /// Get the call counts for verification in tests.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Get all captured listing requests.
    pub async fn captured_requests(&self) -> Vec<ListImagesRequest> {
        self.captured_requests.lock().await.clone()
    }
}

#[async_trait]
impl IdentityApi for MockCloud {
    async fn assume_role(&self, request: &AssumeRoleRequest) -> UpstreamResult<Credentials> {
        self.call_count.lock().await.assume_role += 1;

        if self.denied_accounts.contains(&request.account_id) {
            return Err(UpstreamError::Auth {
                account: request.account_id.clone(),
                message: "AccessDenied".to_string(),
            });
        }

        Ok(Credentials {
            account_id: request.account_id.clone(),
            access_key_id: "foo".to_string(),
            secret_access_key: "bar".to_string(),
            session_token: "baz".to_string(),
            expires_at: Utc::now() + chrono::Duration::minutes(15),
        })
    }
}

#[async_trait]
impl InventoryApi for MockCloud {
    async fn list_images(
        &self,
        _credentials: &Credentials,
        request: &ListImagesRequest,
    ) -> UpstreamResult<Vec<ImageDescriptor>> {
        self.call_count.lock().await.list_images += 1;
        self.captured_requests.lock().await.push(request.clone());

        let delay = *self.list_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let key = (request.owner_id.clone(), request.region.clone());
        if self.failing_listings.contains(&key) {
            return Err(UpstreamError::Request("RequestLimitExceeded".to_string()));
        }

        Ok(self
            .images
            .lock()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_visibility(
        &self,
        _credentials: &Credentials,
        _region: &str,
        image_id: &str,
    ) -> UpstreamResult<Vec<String>> {
        {
            let mut counts = self.call_count.lock().await;
            counts.describe_visibility += 1;
            counts.in_flight_visibility += 1;
            counts.max_concurrent_visibility = counts
                .max_concurrent_visibility
                .max(counts.in_flight_visibility);
        }

        if let Some(delay) = self.grant_delay {
            tokio::time::sleep(delay).await;
        }

        self.call_count.lock().await.in_flight_visibility -= 1;

        if self.failing_grants.contains(image_id) {
            return Err(UpstreamError::Request("InvalidAMIID.Unavailable".to_string()));
        }

        Ok(self.grants.get(image_id).cloned().unwrap_or_default())
    }
}
