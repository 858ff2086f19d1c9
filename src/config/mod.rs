//! Configuration management for ami-query
//!
//! Settings come from an optional YAML file and are overridden by command-line
//! flags and `AMIQUERY_*` environment variables (see [`crate::cli`]).

mod cache;
mod regions;
mod ttl;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub use cache::{CacheConfig, DEFAULT_CACHE_TTL, DEFAULT_MAX_CONCURRENT_REQUESTS, MIN_CACHE_TTL};
pub use regions::{DEFAULT_REGIONS, default_regions, is_known_region};
pub use ttl::parse_ttl;

/// Application configuration as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Role assumed in every owner account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,

    /// Accounts whose images are cached
    #[serde(default)]
    pub owner_ids: Vec<String>,

    /// Regions polled; empty means every default region
    #[serde(default)]
    pub regions: Vec<String>,

    /// Only cache images carrying this tag key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_filter: Option<String>,

    /// Tag key holding the lifecycle state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_tag: Option<String>,

    /// Time between refreshes, e.g. `15m` or bare seconds
    #[serde(default, with = "ttl::option", skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<Duration>,

    /// Cap on concurrent launch-permission lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<usize>,

    /// Per-account pacing of launch-permission lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests_per_second: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_launch_permissions: Option<bool>,

    /// Inventory file backing the upstream services
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,
}

/// Values supplied on the command line or through the environment.
/// Anything set here wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub role_name: Option<String>,
    pub owner_ids: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub tag_filter: Option<String>,
    pub state_tag: Option<String>,
    pub cache_ttl: Option<Duration>,
    pub max_concurrent_requests: Option<usize>,
    pub max_requests_per_second: Option<f64>,
    pub collect_launch_permissions: Option<bool>,
    pub inventory: Option<PathBuf>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".ami-query").join("config.yaml"))
    }

    /// Load configuration from `path`, or from the default path when none is
    /// given. A missing default file yields an empty configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    log::debug!("No config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Layer `overrides` on top of this configuration.
    pub fn merge(mut self, overrides: Overrides) -> Self {
        if let Some(role_name) = overrides.role_name {
            self.role_name = Some(role_name);
        }
        if let Some(owner_ids) = overrides.owner_ids {
            self.owner_ids = owner_ids;
        }
        if let Some(regions) = overrides.regions {
            self.regions = regions;
        }
        if let Some(tag_filter) = overrides.tag_filter {
            self.tag_filter = Some(tag_filter);
        }
        if let Some(state_tag) = overrides.state_tag {
            self.state_tag = Some(state_tag);
        }
        if let Some(ttl) = overrides.cache_ttl {
            self.cache_ttl = Some(ttl);
        }
        if let Some(max) = overrides.max_concurrent_requests {
            self.max_concurrent_requests = Some(max);
        }
        if let Some(rate) = overrides.max_requests_per_second {
            self.max_requests_per_second = Some(rate);
        }
        if let Some(collect) = overrides.collect_launch_permissions {
            self.collect_launch_permissions = Some(collect);
        }
        if let Some(inventory) = overrides.inventory {
            self.inventory = Some(inventory);
        }
        self
    }

    /// Validate into the settings a cache runs with.
    pub fn cache_config(&self) -> std::result::Result<CacheConfig, ConfigError> {
        let config = CacheConfig::new(
            self.role_name.clone().unwrap_or_default(),
            self.owner_ids.iter().cloned(),
        )?
        .with_regions(self.regions.iter().cloned())?
        .with_tag_filter(self.tag_filter.clone())
        .with_state_tag(self.state_tag.clone())
        .with_ttl(self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL))
        .with_max_concurrent_requests(
            self.max_concurrent_requests
                .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS),
        )?
        .with_collect_visibility(self.collect_launch_permissions.unwrap_or(true))
        .with_max_requests_per_second(self.max_requests_per_second)?;

        Ok(config)
    }

    /// The inventory file, required to run without cloud access.
    pub fn inventory_path(&self) -> std::result::Result<&Path, ConfigError> {
        self.inventory.as_deref().ok_or_else(|| {
            ConfigError::Invalid(
                "No inventory configured. Set AMIQUERY_INVENTORY or `inventory` in the config file."
                    .to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn base() -> Config {
        Config {
            role_name: Some("ami-query".to_string()),
            owner_ids: vec!["111122223333".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.role_name.is_none());
        assert!(config.owner_ids.is_empty());
        assert!(config.inventory.is_none());
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "role_name: ami-query\nowner_ids: ['111122223333', '444455556666']\nregions: [us-west-1]\ncache_ttl: 600\ncollect_launch_permissions: false"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.role_name.as_deref(), Some("ami-query"));
        assert_eq!(config.owner_ids.len(), 2);
        assert_eq!(config.regions, vec!["us-west-1"]);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.collect_launch_permissions, Some(false));
    }

    #[test]
    fn test_load_ttl_as_duration_string() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache_ttl: 20m").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(1200)));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache_ttl: later").unwrap();
        assert!(matches!(
            Config::load_from(file.path()).unwrap_err(),
            crate::error::Error::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/config.yaml"))).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "owner_ids: {{not: [valid").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_overrides_win() {
        let config = base().merge(Overrides {
            owner_ids: Some(vec!["999999999999".to_string()]),
            state_tag: Some("status".to_string()),
            ..Default::default()
        });

        assert_eq!(config.role_name.as_deref(), Some("ami-query"));
        assert_eq!(config.owner_ids, vec!["999999999999"]);
        assert_eq!(config.state_tag.as_deref(), Some("status"));
    }

    #[test]
    fn test_cache_config_defaults() {
        let cache = base().cache_config().unwrap();
        assert_eq!(cache.ttl(), DEFAULT_CACHE_TTL);
        assert_eq!(cache.max_concurrent_requests(), DEFAULT_MAX_CONCURRENT_REQUESTS);
        assert!(cache.collect_visibility());
        assert_eq!(cache.regions().len(), DEFAULT_REGIONS.len());
    }

    #[test]
    fn test_cache_config_requires_role_and_owners() {
        let err = Config::default().cache_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRoleName));

        let config = Config {
            role_name: Some("ami-query".to_string()),
            ..Default::default()
        };
        let err = config.cache_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingOwnerIds));
    }

    #[test]
    fn test_cache_config_clamps_ttl() {
        let config = Config {
            cache_ttl: Some(Duration::from_secs(10)),
            ..base()
        };
        assert_eq!(config.cache_config().unwrap().ttl(), MIN_CACHE_TTL);
    }

    #[test]
    fn test_cache_config_rejects_unknown_region() {
        let config = Config {
            regions: vec!["us-bogus-1".to_string()],
            ..base()
        };
        assert!(matches!(
            config.cache_config().unwrap_err(),
            ConfigError::UnsupportedRegion(_)
        ));
    }

    #[test]
    fn test_inventory_path_required() {
        assert!(base().inventory_path().is_err());

        let config = Config {
            inventory: Some(PathBuf::from("/tmp/inventory.yaml")),
            ..base()
        };
        assert_eq!(
            config.inventory_path().unwrap(),
            Path::new("/tmp/inventory.yaml")
        );
    }
}
