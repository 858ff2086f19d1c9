//! Cached image records and lifecycle-state ranking

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::client::ImageDescriptor;

/// The default tag key holding an image's lifecycle state.
pub const DEFAULT_STATE_TAG: &str = "state";

/// Tag keys accepted as the state tag in queries, in addition to the configured key.
pub const STATE_TAG_ALIASES: [&str; 2] = ["state", "status"];

/// Layout of `creationDate` values returned by the inventory API.
const CREATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Weight unit for lifecycle states. Large enough that any state outranks
/// every plausible creation-date difference.
const STATE_WEIGHT_UNIT: u64 = 10_000_000_000;

/// Lifecycle state weights, lowest to highest.
const STATE_WEIGHTS: [(&str, u64); 7] = [
    ("deregistered", 1),
    ("development", 2),
    ("pre-release", 3),
    ("unavailable", 4),
    ("exception", 5),
    ("deprecated", 6),
    ("available", 7),
];

/// One machine image as seen in a single snapshot.
///
/// Records are never mutated once built; a refresh produces new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    id: String,
    owner_id: String,
    region: String,
    name: String,
    description: String,
    virtualization_type: String,
    creation_date: String,
    tags: BTreeMap<String, String>,
    visibility_grants: BTreeSet<String>,
}

impl Image {
    /// Build a record from an inventory descriptor, tagged with its owner and region.
    pub fn new(
        descriptor: ImageDescriptor,
        owner_id: impl Into<String>,
        region: impl Into<String>,
        visibility_grants: impl IntoIterator<Item = String>,
    ) -> Self {
        let tags = descriptor
            .tags
            .into_iter()
            .map(|tag| (tag.key, tag.value))
            .collect();

        Self {
            id: descriptor.image_id,
            owner_id: owner_id.into(),
            region: region.into(),
            name: descriptor.name.unwrap_or_default(),
            description: descriptor.description.unwrap_or_default(),
            virtualization_type: descriptor.virtualization_type.unwrap_or_default(),
            creation_date: descriptor.creation_date.unwrap_or_default(),
            tags,
            visibility_grants: visibility_grants.into_iter().collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn virtualization_type(&self) -> &str {
        &self.virtualization_type
    }

    pub fn creation_date(&self) -> &str {
        &self.creation_date
    }

    /// Value of the tag `key`, if the image carries it.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// All tags on the image.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Accounts allowed to launch the image. Empty when grants were not collected.
    pub fn visibility_grants(&self) -> &BTreeSet<String> {
        &self.visibility_grants
    }

    pub fn is_visible_to(&self, account_id: &str) -> bool {
        self.visibility_grants.contains(account_id)
    }

    /// Ranking score: creation time as UNIX seconds plus the weight of the
    /// lifecycle state found under `state_tag`.
    pub fn score(&self, state_tag: &str) -> u64 {
        let created = creation_epoch(&self.creation_date);
        let state = self.tag(state_tag).map(state_weight).unwrap_or(0);
        created.saturating_add(state)
    }
}

/// Weight of a lifecycle state name. Unknown states weigh nothing.
pub fn state_weight(state: &str) -> u64 {
    let state = state.to_lowercase();
    STATE_WEIGHTS
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, rank)| rank * STATE_WEIGHT_UNIT)
        .unwrap_or(0)
}

/// Parse a `creationDate` into UNIX seconds; anything unparsable (or before
/// the epoch) counts as 0.
fn creation_epoch(date: &str) -> u64 {
    NaiveDateTime::parse_from_str(date, CREATION_DATE_FORMAT)
        .ok()
        .and_then(|dt| u64::try_from(dt.and_utc().timestamp()).ok())
        .unwrap_or(0)
}

/// Whether `a` sorts before `b`: higher state first, then newer first.
pub fn rank(a: &Image, b: &Image, state_tag: &str) -> bool {
    a.score(state_tag) > b.score(state_tag)
}

/// Sort images newest and most available first. Equal scores keep their
/// relative order.
pub fn sort_by_state<T: AsRef<Image>>(images: &mut [T], state_tag: &str) {
    images.sort_by_cached_key(|image| std::cmp::Reverse(image.as_ref().score(state_tag)));
}

impl AsRef<Image> for Image {
    fn as_ref(&self) -> &Image {
        self
    }
}
