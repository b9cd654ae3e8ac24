//! Configuration types.
//!
//! Everything the pipeline needs is passed in explicitly at construction
//! time — there is no ambient global state. Policy objects (filter rules,
//! scoring lexicons, the monitored-source list) are plain data on these
//! structs so multiple pipeline instances with different policies can
//! coexist and be tested in isolation.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// One monitored upstream source (a Telegram channel).
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Channel username, without the leading `@`.
    pub name: String,
    /// Senders whose posts are accepted. Empty means discovery mode:
    /// accept everyone and log sender names so the list can be filled in.
    #[serde(default)]
    pub allowed_senders: Vec<String>,
    /// Source-level weight carried onto stored items.
    #[serde(default = "default_priority")]
    pub priority: i64,
}

fn default_priority() -> i64 {
    1
}

/// Polling-loop cadence.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Messages pulled per source per pass.
    pub batch_size: usize,
    /// Sleep between full passes.
    pub pass_interval: Duration,
    /// Settling delay after each accepted publish.
    pub publish_delay: Duration,
    /// Backoff after a pass-level failure.
    pub error_backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            pass_interval: Duration::from_secs(300),
            publish_delay: Duration::from_secs(30),
            error_backoff: Duration::from_secs(60),
        }
    }
}

/// Top-level relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Path to the libSQL database file.
    pub db_path: String,
    /// Monitored sources.
    pub sources: Vec<SourceConfig>,
    /// Dominant red/black pixel fraction at which a photo is rejected.
    pub media_threshold: f32,
    /// Retention sweep cutoff in days (floored at 7 by the store).
    pub retention_days: i64,
    /// Directory for downloaded media.
    pub media_dir: String,
    /// Loop cadence.
    pub cadence: LoopConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/osint-relay.db".to_string(),
            sources: Vec::new(),
            media_threshold: 0.7,
            retention_days: 30,
            media_dir: "./media".to_string(),
            cadence: LoopConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Build the configuration from environment variables.
    ///
    /// `RELAY_SOURCES` is a JSON array of [`SourceConfig`] objects, e.g.
    /// `[{"name":"somechannel","allowed_senders":["Some Channel"],"priority":1}]`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("RELAY_DB_PATH") {
            config.db_path = path;
        }
        if let Ok(dir) = std::env::var("RELAY_MEDIA_DIR") {
            config.media_dir = dir;
        }
        if let Ok(json) = std::env::var("RELAY_SOURCES") {
            config.sources =
                serde_json::from_str(&json).map_err(|e| ConfigError::InvalidValue {
                    key: "RELAY_SOURCES".to_string(),
                    message: e.to_string(),
                })?;
        }
        if let Ok(raw) = std::env::var("RELAY_MEDIA_THRESHOLD") {
            config.media_threshold = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RELAY_MEDIA_THRESHOLD".to_string(),
                message: format!("not a float: {raw}"),
            })?;
        }
        if let Ok(raw) = std::env::var("RELAY_RETENTION_DAYS") {
            config.retention_days = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RELAY_RETENTION_DAYS".to_string(),
                message: format!("not an integer: {raw}"),
            })?;
        }
        if let Ok(raw) = std::env::var("RELAY_BATCH_SIZE") {
            config.cadence.batch_size = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RELAY_BATCH_SIZE".to_string(),
                message: format!("not an integer: {raw}"),
            })?;
        }
        if let Ok(raw) = std::env::var("RELAY_PASS_INTERVAL_SECS") {
            config.cadence.pass_interval = parse_secs("RELAY_PASS_INTERVAL_SECS", &raw)?;
        }
        if let Ok(raw) = std::env::var("RELAY_PUBLISH_DELAY_SECS") {
            config.cadence.publish_delay = parse_secs("RELAY_PUBLISH_DELAY_SECS", &raw)?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("not a number of seconds: {raw}"),
        })
}

/// Read a required environment variable.
pub fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadence_values() {
        let config = RelayConfig::default();
        assert_eq!(config.cadence.batch_size, 4);
        assert_eq!(config.cadence.pass_interval, Duration::from_secs(300));
        assert_eq!(config.cadence.publish_delay, Duration::from_secs(30));
        assert_eq!(config.media_threshold, 0.7);
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn source_config_deserializes_with_defaults() {
        let sources: Vec<SourceConfig> =
            serde_json::from_str(r#"[{"name":"worldnews"}]"#).unwrap();
        assert_eq!(sources[0].name, "worldnews");
        assert!(sources[0].allowed_senders.is_empty());
        assert_eq!(sources[0].priority, 1);
    }
}
