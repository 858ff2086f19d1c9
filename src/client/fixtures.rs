//! Test fixtures for upstream model types
//!
//! Import via `use crate::client::fixtures::*` in test modules.

#![allow(dead_code)]

use super::models::{ImageDescriptor, Tag};

/// Builder for test [`ImageDescriptor`] values.
///
/// # Example
/// ```ignore
/// let image = DescriptorBuilder::new("ami-1a2b3c4d")
///     .created("2017-11-29T16:00:00.000Z")
///     .tag("state", "available")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: ImageDescriptor,
}

impl DescriptorBuilder {
    pub fn new(image_id: impl Into<String>) -> Self {
        let image_id = image_id.into();
        Self {
            descriptor: ImageDescriptor {
                name: Some(format!("name-{}", image_id)),
                description: Some(format!("Image {}", image_id)),
                virtualization_type: Some("hvm".to_string()),
                creation_date: Some("2017-11-29T16:00:00.000Z".to_string()),
                image_id,
                tags: Vec::new(),
            },
        }
    }

    pub fn created(mut self, date: impl Into<String>) -> Self {
        self.descriptor.creation_date = Some(date.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.descriptor.tags.push(Tag::new(key, value));
        self
    }

    pub fn build(self) -> ImageDescriptor {
        self.descriptor
    }
}

/// Shorthand for an image with only a state tag.
pub fn descriptor(image_id: &str, state: &str) -> ImageDescriptor {
    DescriptorBuilder::new(image_id).tag("state", state).build()
}
