//! Upstream service clients
//!
//! The refresh engine talks to two services through the traits in [`api`]:
//! an identity service handing out delegated credentials per account, and an
//! inventory service listing images and their launch permissions.

use crate::error::UpstreamError;

pub mod api;
pub mod file;
#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod parallel;
pub mod rate_limit;

pub use api::{IdentityApi, InventoryApi};
pub use file::FileInventory;
#[cfg(test)]
pub use mock::MockCloud;
pub use models::{AssumeRoleRequest, Credentials, ImageDescriptor, ListImagesRequest, Tag};
pub use parallel::{pool_size, run_bounded};
pub use rate_limit::RequestLimiter;

/// Result type for upstream calls
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;
