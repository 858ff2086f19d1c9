//! Inventory service trait

use async_trait::async_trait;

use crate::client::UpstreamResult;
use crate::client::models::{Credentials, ImageDescriptor, ListImagesRequest};

/// Image inventory operations, always performed under delegated credentials
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// List the images owned by `request.owner_id` in `request.region`.
    async fn list_images(
        &self,
        credentials: &Credentials,
        request: &ListImagesRequest,
    ) -> UpstreamResult<Vec<ImageDescriptor>>;

    /// Account ids holding a launch permission on the image.
    async fn describe_visibility(
        &self,
        credentials: &Credentials,
        region: &str,
        image_id: &str,
    ) -> UpstreamResult<Vec<String>>;
}
