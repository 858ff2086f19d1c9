//! Image queries
//!
//! [`Params`] decodes a URL query string such as
//! `region=us-west-2&tag=os:linux&state=available&pretty` and
//! [`find_images`] answers it from the cache: filtered per region, then
//! ranked by lifecycle state and age.

use std::collections::HashMap;

use crate::cache::Cache;
use crate::error::{CacheError, QueryError};
use crate::filter::{ByImageId, ByOwner, ByTags, ByVisibility, Filter, ImageRef};
use crate::image::{STATE_TAG_ALIASES, sort_by_state};

/// Decoded query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Regions to search; empty means every supported region
    pub regions: Vec<String>,
    /// Image ids to match
    pub images: Vec<String>,
    /// Tag key to accepted values
    pub tags: HashMap<String, Vec<String>>,
    /// Only images owned by this account
    pub owner_id: Option<String>,
    /// Only images this account may launch
    pub launch_permission: Option<String>,
    /// Wrap the response as `callback(...);`
    pub callback: Option<String>,
    /// Indent the response
    pub pretty: bool,
}

impl Params {
    /// Decode a raw query string. `state_tag` is the configured lifecycle tag
    /// key; it and the `state`/`status` aliases all filter on that key.
    pub fn decode(raw_query: &str, state_tag: &str) -> Result<Self, QueryError> {
        let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);
        check_escapes(raw_query)?;

        let mut params = Params::default();

        for (key, values) in group_by_key(raw_query) {
            let values = dedup(values);
            match key.as_str() {
                "tag" => {
                    for value in values {
                        let (tag_key, tag_value) = value
                            .split_once(':')
                            .filter(|(k, _)| !k.is_empty())
                            .ok_or_else(|| QueryError::InvalidTag(value.clone()))?;
                        push_unique(
                            params.tags.entry(tag_key.to_string()).or_default(),
                            tag_value.to_string(),
                        );
                    }
                }
                "ami" => params.images = values,
                "region" => params.regions = values,
                "owner_id" => params.owner_id = values.into_iter().next(),
                "launch_permission" => params.launch_permission = values.into_iter().next(),
                "callback" => params.callback = values.into_iter().next(),
                "pretty" => {
                    params.pretty = params.pretty || values.first().is_some_and(|v| v != "0");
                }
                key if key == state_tag || STATE_TAG_ALIASES.contains(&key) => {
                    let states = params.tags.entry(state_tag.to_string()).or_default();
                    for value in values {
                        push_unique(states, value);
                    }
                }
                _ => return Err(QueryError::UnknownKey(key.clone())),
            }
        }

        Ok(params)
    }

    /// The filter pipeline these parameters describe.
    pub fn filter(&self) -> Filter {
        Filter::new()
            .with(ByImageId::new(self.images.iter().cloned()))
            .with(ByOwner::new(self.owner_id.clone()))
            .with(ByVisibility::new(self.launch_permission.clone()))
            .with(ByTags::new(self.tags.clone()))
    }
}

/// Run a query against the cache: every requested region (or all of them),
/// filtered, then ranked with the cache's state tag.
pub fn find_images(cache: &Cache, params: &Params) -> Result<Vec<ImageRef>, CacheError> {
    let regions: &[String] = if params.regions.is_empty() {
        cache.regions()
    } else {
        &params.regions
    };

    let filter = params.filter();
    let mut images = Vec::new();
    for region in regions {
        images.extend(cache.filter_images(region, &filter)?);
    }

    sort_by_state(&mut images, cache.state_tag());
    log::debug!(
        "Query matched {} images across {} regions",
        images.len(),
        regions.len()
    );

    Ok(images)
}

/// Split a query into keys in first-seen order, each with all its values.
fn group_by_key(raw_query: &str) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()) {
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    grouped
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        push_unique(&mut unique, value);
    }
    unique
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Reject percent signs not followed by two hex digits.
fn check_escapes(raw_query: &str) -> Result<(), QueryError> {
    let bytes = raw_query.as_bytes();
    for (i, _) in raw_query.match_indices('%') {
        let escape = bytes.get(i + 1..i + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            let end = (i + 3).min(raw_query.len());
            let shown = raw_query.get(i..end).unwrap_or("%");
            return Err(QueryError::Malformed(format!(
                "invalid URL escape {:?}",
                shown
            )));
        }
    }
    Ok(())
}
