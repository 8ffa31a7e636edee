//! Configuration types module
//!
//! One section per concern: the work queue, PostgreSQL storage, the
//! sandbox, the consumer loop and logging.

pub mod queue;
pub mod sandbox;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main worker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Work queue configuration
    #[serde(default)]
    pub queue: queue::QueueConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: storage::StorageConfig,

    /// Sandbox configuration
    #[serde(default)]
    pub sandbox: sandbox::SandboxConfig,

    /// Job consumer configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Job consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Pause after a loop-level failure before the next dequeue
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
    /// Stop grading at the first non-passing test case
    #[serde(default = "default_true")]
    pub stop_on_first_failure: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            backoff: default_backoff(),
            stop_on_first_failure: true,
        }
    }
}

fn default_backoff() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level for the geekjudge target when RUST_LOG does not say
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid log format: {}. Valid: pretty, json",
                s
            ))),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.worker.backoff, Duration::from_secs(5));
        assert!(config.worker.stop_on_first_failure);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.queue.name, "jobQueue");
    }

    #[test]
    fn test_humantime_durations() {
        let config: Config = serde_json::from_str(
            r#"{"worker": {"backoff": "2s", "stop_on_first_failure": false}, "sandbox": {"timeout": "1m 30s"}}"#,
        )
        .unwrap();
        assert_eq!(config.worker.backoff, Duration::from_secs(2));
        assert!(!config.worker.stop_on_first_failure);
        assert_eq!(config.sandbox.timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
