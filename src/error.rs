//! Error types for ami-query

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ami-query operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error was caused by the caller's request rather than the service.
    ///
    /// Client errors are returned as-is and never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Query(_) | Error::Cache(CacheError::UnsupportedRegion(_))
        )
    }
}

/// Errors raised by the cache store and its lifecycle controller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("unknown or unsupported region: {0}")]
    UnsupportedRegion(String),

    #[error("cache running")]
    AlreadyRunning,

    #[error("cache not running")]
    NotRunning,
}

/// Failures talking to the identity or inventory services.
///
/// These never escape a refresh cycle; they are logged with their
/// account/region/image context and the affected branch contributes nothing.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("failed to assume role in account {account}: {message}")]
    Auth { account: String, message: String },

    #[error("upstream request failed: {0}")]
    Request(String),
}

/// Malformed query parameters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown query key: {0}")]
    UnknownKey(String),

    #[error("invalid query tag value: {0}")]
    InvalidTag(String),

    #[error("invalid query string: {0}")]
    Malformed(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Role name is undefined. Set AMIQUERY_ROLE_NAME or `role_name` in the config file.")]
    MissingRoleName,

    #[error("Owner IDs are undefined. Set AMIQUERY_OWNER_IDS or `owner_ids` in the config file.")]
    MissingOwnerIds,

    #[error("unknown or unsupported region: {0}")]
    UnsupportedRegion(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
