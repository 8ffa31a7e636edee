//! Work queue configuration types

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Redis work queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis connection URL
    #[serde(skip_serializing, default = "default_url")]
    pub url: SecretString,
    /// Name of the list submission ids are pushed onto
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            url: default_url(),
            name: default_name(),
        }
    }
}

fn default_url() -> SecretString {
    SecretString::from("redis://127.0.0.1:6379".to_string())
}

fn default_name() -> String {
    "jobQueue".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_queue_config_default() {
        let config = QueueConfig::default();
        assert_eq!(config.name, "jobQueue");
        assert_eq!(config.url.expose_secret(), "redis://127.0.0.1:6379");
    }

    #[test]
    fn test_url_is_not_serialized() {
        let json = serde_json::to_string(&QueueConfig::default()).unwrap();
        assert!(!json.contains("redis://"));
    }
}
