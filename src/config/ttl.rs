//! Refresh interval parsing
//!
//! Accepts duration strings (`15m`, `1h 30m`, `900s`) as well as bare
//! seconds (`900`), from flags, the environment and the config file.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Parse a refresh interval.
pub fn parse_ttl(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| format!("invalid cache TTL {:?}: {}", value, e));
    }
    humantime::parse_duration(value).map_err(|e| format!("invalid cache TTL {:?}: {}", value, e))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTtl {
    Seconds(u64),
    Text(String),
}

/// serde adapter for `Option<Duration>` fields written as a TTL.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(ttl: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match ttl {
            Some(ttl) => serializer.collect_str(&humantime::format_duration(*ttl)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        match Option::<RawTtl>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawTtl::Seconds(secs)) => Ok(Some(Duration::from_secs(secs))),
            Some(RawTtl::Text(text)) => parse_ttl(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
