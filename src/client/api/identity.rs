//! Identity service trait

use async_trait::async_trait;

use crate::client::UpstreamResult;
use crate::client::models::{AssumeRoleRequest, Credentials};

/// Delegated-identity operations (STS-style role assumption)
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Assume the configured role in the request's account.
    ///
    /// Failures are reported as [`UpstreamError::Auth`](crate::error::UpstreamError::Auth).
    async fn assume_role(&self, request: &AssumeRoleRequest) -> UpstreamResult<Credentials>;
}
