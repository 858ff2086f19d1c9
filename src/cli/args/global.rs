//! Global CLI options shared across all commands
//!
//! Collects the global flags once so handlers take a single argument.

use std::path::{Path, PathBuf};

use crate::cli::{Cli, OutputFormat};
use crate::config::Overrides;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// CLI flag > environment variable > config file > default. This struct
/// captures the flag/env layer; the file is merged under it in
/// `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (json, table)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.ami-query/config.yaml)
    pub config: Option<PathBuf>,

    /// Settings overriding the config file
    pub overrides: Overrides,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            overrides: Overrides {
                role_name: cli.role_name.clone(),
                owner_ids: cli.owner_ids.clone(),
                regions: cli.regions.clone(),
                tag_filter: cli.tag_filter.clone(),
                state_tag: cli.state_tag.clone(),
                cache_ttl: cli.cache_ttl,
                max_concurrent_requests: cli.max_concurrent_requests,
                max_requests_per_second: cli.max_requests_per_second,
                collect_launch_permissions: cli.collect_launch_permissions,
                inventory: cli.inventory.clone(),
            },
        }
    }

    /// Get config path as `Option<&Path>`.
    pub fn config_ref(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}
