//! Storage configuration types
//!
//! Problems and submissions live in PostgreSQL.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// PostgreSQL configuration
    pub postgres: Option<PostgresConfig>,
}

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Database URL
    #[serde(skip_serializing)]
    pub url: SecretString,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        PostgresConfig {
            url: SecretString::from(url.into()),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        assert!(StorageConfig::default().postgres.is_none());
    }

    #[test]
    fn test_postgres_defaults_from_file() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"postgres": {"url": "postgres://judge@localhost/judge"}}"#).unwrap();
        let pg = config.postgres.unwrap();
        assert_eq!(pg.max_connections, 5);
        assert_eq!(pg.connect_timeout_secs, 30);
    }
}
