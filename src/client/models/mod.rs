//! Upstream wire models
//!
//! Types exchanged with the identity and inventory services.

mod identity;
mod image;

pub use identity::{
    AssumeRoleRequest, Credentials, ROLE_SESSION_DURATION, ROLE_SESSION_NAME, ROLE_SESSION_POLICY,
};
pub use image::{ImageDescriptor, ListImagesRequest, Tag};
