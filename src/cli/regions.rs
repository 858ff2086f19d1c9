//! Region listing

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::cli::context::load_config;
use crate::config::{default_regions, is_known_region};
use crate::error::{ConfigError, Result};
use crate::output::format_table;

#[derive(Debug, Serialize, Tabled)]
struct RegionRow {
    #[tabled(rename = "REGION")]
    region: String,
}

/// Print the regions the cache polls: the configured ones, or every default
/// region when none are configured.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config = load_config(opts)?;
    let regions = resolve(&config.regions)?;

    let output = match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(&regions)?,
        OutputFormat::Table => {
            let rows: Vec<RegionRow> = regions
                .into_iter()
                .map(|region| RegionRow { region })
                .collect();
            format_table(&rows)
        }
    };

    println!("{}", output);
    Ok(())
}

fn resolve(configured: &[String]) -> std::result::Result<Vec<String>, ConfigError> {
    if configured.is_empty() {
        return Ok(default_regions());
    }
    configured
        .iter()
        .map(|region| {
            if is_known_region(region) {
                Ok(region.clone())
            } else {
                Err(ConfigError::UnsupportedRegion(region.clone()))
            }
        })
        .collect()
}
