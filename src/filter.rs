//! Composable image filters
//!
//! A [`Filter`] is an ordered chain of [`Filterer`] stages. Every stage
//! narrows the output of the previous one, and a stage given no constraint
//! passes its input through untouched, so stages can always be chained.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::image::Image;

/// Shared, immutable image record as held by a snapshot
pub type ImageRef = Arc<Image>;

/// A single filtering stage
pub trait Filterer: Send + Sync {
    fn filter(&self, images: Vec<ImageRef>) -> Vec<ImageRef>;
}

/// Plain functions and closures are filter stages too.
impl<F> Filterer for F
where
    F: Fn(Vec<ImageRef>) -> Vec<ImageRef> + Send + Sync,
{
    fn filter(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        self(images)
    }
}

/// Ordered pipeline of filter stages
#[derive(Default)]
pub struct Filter {
    filters: Vec<Box<dyn Filterer>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the pipeline.
    pub fn with(mut self, filter: impl Filterer + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Run every stage in order. Output order is not significant.
    pub fn apply(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        self.filters
            .iter()
            .fold(images, |images, stage| stage.filter(images))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Keep images whose id is in the set.
#[derive(Debug, Clone, Default)]
pub struct ByImageId(HashSet<String>);

impl ByImageId {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }
}

impl Filterer for ByImageId {
    fn filter(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        if self.0.is_empty() {
            return images;
        }
        images
            .into_iter()
            .filter(|image| self.0.contains(image.id()))
            .collect()
    }
}

/// Keep images matching every key, each with one of the listed values.
#[derive(Debug, Clone, Default)]
pub struct ByTags(HashMap<String, Vec<String>>);

impl ByTags {
    pub fn new(tags: HashMap<String, Vec<String>>) -> Self {
        Self(tags)
    }

    fn matches(&self, image: &Image) -> bool {
        self.0.iter().all(|(key, values)| {
            image
                .tag(key)
                .is_some_and(|value| values.iter().any(|v| v == value))
        })
    }
}

impl Filterer for ByTags {
    fn filter(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        if self.0.is_empty() {
            return images;
        }
        images
            .into_iter()
            .filter(|image| self.matches(image))
            .collect()
    }
}

/// Keep images owned by the account.
#[derive(Debug, Clone, Default)]
pub struct ByOwner(Option<String>);

impl ByOwner {
    pub fn new(owner_id: Option<impl Into<String>>) -> Self {
        Self(owner_id.map(Into::into).filter(|id| !id.is_empty()))
    }
}

impl Filterer for ByOwner {
    fn filter(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        match &self.0 {
            None => images,
            Some(owner) => images
                .into_iter()
                .filter(|image| image.owner_id() == owner)
                .collect(),
        }
    }
}

/// Keep images the account has been granted launch permission on.
#[derive(Debug, Clone, Default)]
pub struct ByVisibility(Option<String>);

impl ByVisibility {
    pub fn new(account_id: Option<impl Into<String>>) -> Self {
        Self(account_id.map(Into::into).filter(|id| !id.is_empty()))
    }
}

impl Filterer for ByVisibility {
    fn filter(&self, images: Vec<ImageRef>) -> Vec<ImageRef> {
        match &self.0 {
            None => images,
            Some(account) => images
                .into_iter()
                .filter(|image| image.is_visible_to(account))
                .collect(),
        }
    }
}
