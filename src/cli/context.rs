//! Command execution context
//!
//! Loads configuration, validates it, and wires the cache to its upstream
//! services, so handlers start from a ready [`Cache`].

use std::sync::Arc;

use crate::cache::Cache;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::FileInventory;
use crate::config::Config;
use crate::error::Result;

/// Context for command execution containing config, cache, and runtime options.
pub struct CommandContext {
    /// Merged configuration (file + flags + environment)
    pub config: Config,
    /// Cache backed by the configured inventory
    pub cache: Arc<Cache>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context with full initialization.
    ///
    /// # Errors
    /// Returns error if the config cannot be loaded or is invalid, or the
    /// inventory file cannot be read.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = load_config(opts)?;
        let cache_config = config.cache_config()?;

        let inventory = Arc::new(FileInventory::load(config.inventory_path()?)?);
        let cache = Arc::new(Cache::new(cache_config, inventory.clone(), inventory));

        Ok(Self {
            config,
            cache,
            format: opts.format,
        })
    }
}

/// Load the config file and layer flag/environment overrides on top.
pub fn load_config(opts: &GlobalOptions) -> Result<Config> {
    let config = Config::load(opts.config_ref())?;
    Ok(config.merge(opts.overrides.clone()))
}
