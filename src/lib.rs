//! ami-query - a continuously refreshed, queryable snapshot of machine image
//! metadata across many accounts and regions.
//!
//! The [`cache::Cache`] assumes a role in each owner account, lists images
//! per region, optionally collects launch permissions, and serves the result
//! from memory. [`query`] decodes lookups and ranks the matching images.

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod image;
pub mod output;
pub mod query;

pub use cache::{Cache, CycleOutcome, Shutdown};
pub use config::{CacheConfig, Config};
pub use error::{Error, Result};
pub use filter::{Filter, Filterer, ImageRef};
pub use image::Image;
