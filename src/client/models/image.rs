//! Image listing models

use serde::{Deserialize, Serialize};

/// Key/value tag attached to an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Raw image as returned by the inventory listing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    /// Image ID
    pub image_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Virtualization type (hvm, paravirtual)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualization_type: Option<String>,

    /// Creation timestamp, `YYYY-MM-DDTHH:MM:SS.sssZ`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Parameters of one image listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListImagesRequest {
    pub region: String,
    pub owner_id: String,
    /// Only list images carrying this tag key (value ignored)
    pub tag_filter: Option<String>,
}

impl ListImagesRequest {
    pub fn new(region: &str, owner_id: &str, tag_filter: Option<&str>) -> Self {
        Self {
            region: region.to_string(),
            owner_id: owner_id.to_string(),
            tag_filter: tag_filter.map(str::to_string),
        }
    }
}
