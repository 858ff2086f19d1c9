//! CLI command definitions and handlers

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::parse_ttl;

pub mod args;
pub mod context;
pub mod query;
pub mod regions;
pub mod run;

pub use crate::output::OutputFormat;
pub use args::GlobalOptions;
pub use context::CommandContext;

/// ami-query - cached, queryable machine image inventory
#[derive(Parser, Debug)]
#[command(name = "ami-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table)
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_FORMAT",
        default_value = "json",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "AMIQUERY_CONFIG", hide_env = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, env = "AMIQUERY_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Role assumed in every owner account
    #[arg(long, global = true, env = "AMIQUERY_ROLE_NAME", hide_env = true)]
    pub role_name: Option<String>,

    /// Comma-separated accounts whose images are cached
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_OWNER_IDS",
        hide_env = true,
        value_delimiter = ','
    )]
    pub owner_ids: Option<Vec<String>>,

    /// Comma-separated regions to poll (default: all)
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_REGIONS",
        hide_env = true,
        value_delimiter = ','
    )]
    pub regions: Option<Vec<String>>,

    /// Only cache images carrying this tag key
    #[arg(long, global = true, env = "AMIQUERY_TAG_FILTER", hide_env = true)]
    pub tag_filter: Option<String>,

    /// Tag key holding the image lifecycle state
    #[arg(long, global = true, env = "AMIQUERY_STATE_TAG", hide_env = true)]
    pub state_tag: Option<String>,

    /// Time between cache refreshes, e.g. `15m` or seconds (minimum 5m)
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_CACHE_TTL",
        hide_env = true,
        value_parser = parse_ttl
    )]
    pub cache_ttl: Option<Duration>,

    /// Cap on concurrent launch-permission lookups
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_CACHE_MAX_CONCURRENT_REQUESTS",
        hide_env = true
    )]
    pub max_concurrent_requests: Option<usize>,

    /// Per-account launch-permission lookups per second
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_CACHE_MAX_REQUESTS_PER_SECOND",
        hide_env = true
    )]
    pub max_requests_per_second: Option<f64>,

    /// Collect launch permissions for every image (true/false)
    #[arg(
        long,
        global = true,
        env = "AMIQUERY_COLLECT_LAUNCH_PERMISSIONS",
        hide_env = true,
        action = ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub collect_launch_permissions: Option<bool>,

    /// Inventory file backing the upstream services
    #[arg(long, global = true, env = "AMIQUERY_INVENTORY", hide_env = true)]
    pub inventory: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Keep the cache refreshed until interrupted
    Run,

    /// Refresh once and answer a query
    #[command(after_help = "\
Query keys:
  region=<REGION>            Search only this region (repeatable)
  ami=<ID>                   Match image ids (repeatable)
  tag=<KEY>:<VALUE>          Match tag values (repeatable)
  state=<STATE>              Match lifecycle state (alias: status)
  owner_id=<ACCOUNT>         Match owning account
  launch_permission=<ACCT>   Match accounts allowed to launch
  callback=<NAME>            Wrap JSON output as NAME(...);
  pretty                     Indent JSON output

Example:
  ami-query query 'region=us-west-2&tag=os:linux&state=available&pretty'")]
    Query {
        /// URL query string, e.g. `region=us-west-2&state=available`
        #[arg(default_value = "")]
        query: String,
    },

    /// List the regions the cache polls
    Regions,

    /// Display version information
    Version,
}
