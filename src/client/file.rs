//! File-backed inventory
//!
//! Serves both upstream traits from a YAML document, which lets the binary
//! run end-to-end without cloud access:
//!
//! ```yaml
//! accounts:
//!   "111122223333":
//!     us-west-2:
//!       - imageId: ami-1a2b3c4d
//!         name: base-image
//!         creationDate: "2017-11-29T16:00:00.000Z"
//!         tags:
//!           - key: state
//!             value: available
//!         launchPermissions: ["444455556666"]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::UpstreamResult;
use super::api::{IdentityApi, InventoryApi};
use super::models::{AssumeRoleRequest, Credentials, ImageDescriptor, ListImagesRequest};
use crate::error::{ConfigError, Result, UpstreamError};

/// Image entry in the inventory file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImage {
    #[serde(flatten)]
    pub descriptor: ImageDescriptor,

    #[serde(default)]
    pub launch_permissions: Vec<String>,
}

/// Inventory file layout: account -> region -> images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub accounts: HashMap<String, HashMap<String, Vec<FileImage>>>,
}

/// Identity and inventory services backed by an [`InventoryDocument`]
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: Option<PathBuf>,
    document: InventoryDocument,
}

impl FileInventory {
    /// Load an inventory file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let document: InventoryDocument =
            serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        log::debug!(
            "Loaded inventory from {} ({} accounts)",
            path.display(),
            document.accounts.len()
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            document,
        })
    }

    pub fn from_document(document: InventoryDocument) -> Self {
        Self {
            path: None,
            document,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn region_images(&self, account: &str, region: &str) -> &[FileImage] {
        self.document
            .accounts
            .get(account)
            .and_then(|regions| regions.get(region))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityApi for FileInventory {
    async fn assume_role(&self, request: &AssumeRoleRequest) -> UpstreamResult<Credentials> {
        if !self.document.accounts.contains_key(&request.account_id) {
            return Err(UpstreamError::Auth {
                account: request.account_id.clone(),
                message: format!("role {} not found", request.role_arn),
            });
        }

        let duration = chrono::Duration::from_std(request.duration)
            .unwrap_or_else(|_| chrono::Duration::minutes(15));

        Ok(Credentials {
            account_id: request.account_id.clone(),
            access_key_id: format!("FILE{}", request.account_id),
            secret_access_key: String::new(),
            session_token: String::new(),
            expires_at: Utc::now() + duration,
        })
    }
}

#[async_trait]
impl InventoryApi for FileInventory {
    async fn list_images(
        &self,
        credentials: &Credentials,
        request: &ListImagesRequest,
    ) -> UpstreamResult<Vec<ImageDescriptor>> {
        if credentials.is_expired() {
            return Err(UpstreamError::Request("ExpiredToken".to_string()));
        }

        let images = self
            .region_images(&request.owner_id, &request.region)
            .iter()
            .filter(|image| match &request.tag_filter {
                Some(key) => image.descriptor.tags.iter().any(|tag| &tag.key == key),
                None => true,
            })
            .map(|image| image.descriptor.clone())
            .collect();

        Ok(images)
    }

    async fn describe_visibility(
        &self,
        credentials: &Credentials,
        region: &str,
        image_id: &str,
    ) -> UpstreamResult<Vec<String>> {
        if credentials.is_expired() {
            return Err(UpstreamError::Request("ExpiredToken".to_string()));
        }

        self.region_images(&credentials.account_id, region)
            .iter()
            .find(|image| image.descriptor.image_id == image_id)
            .map(|image| image.launch_permissions.clone())
            .ok_or_else(|| {
                UpstreamError::Request(format!("InvalidAMIID.NotFound: {}", image_id))
            })
    }
}
