//! Configuration I/O - Loading configuration
//!
//! Handles reading configuration from files and environment variables.

use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::storage::PostgresConfig;
use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` first; variables already set in the process environment win.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Overlay values from `lookup` onto `config`; unparsable values are ignored
pub(crate) fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Database overrides
    if let Some(database_url) = lookup("DATABASE_URL") {
        let pg = config
            .storage
            .postgres
            .get_or_insert_with(|| PostgresConfig::new(String::new()));
        pg.url = SecretString::from(database_url);
    }
    if let Some(ref mut pg) = config.storage.postgres {
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            pg.max_connections = v;
        }
        if let Some(v) = lookup("DATABASE_TIMEOUT").and_then(|v| v.parse().ok()) {
            pg.connect_timeout_secs = v;
        }
    }

    // Queue overrides
    if let Some(url) = lookup("REDIS_URL") {
        config.queue.url = SecretString::from(url);
    }
    if let Some(name) = lookup("JUDGE_QUEUE") {
        config.queue.name = name;
    }

    // Sandbox overrides
    if let Some(dir) = lookup("JUDGE_WORKSPACE") {
        config.sandbox.workspace = Some(PathBuf::from(dir));
    }
    if let Some(secs) = lookup("JUDGE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.sandbox.timeout = Duration::from_secs(secs);
    }
    if let Some(limit) = lookup("JUDGE_MEMORY_LIMIT") {
        config.sandbox.memory_limit = limit;
    }
    if let Some(cpus) = lookup("JUDGE_CPU_LIMIT").and_then(|v| v.parse().ok()) {
        config.sandbox.cpu_limit = cpus;
    }

    // Worker overrides
    if let Some(secs) = lookup("JUDGE_BACKOFF_SECS").and_then(|v| v.parse().ok()) {
        config.worker.backoff = Duration::from_secs(secs);
    }
    if let Some(v) = lookup("JUDGE_STOP_ON_FIRST_FAILURE") {
        config.worker.stop_on_first_failure = !matches!(v.trim(), "false" | "0" | "no");
    }

    // Log overrides
    if let Some(format) = lookup("LOG_FORMAT").and_then(|v| v.parse().ok()) {
        config.log.format = format;
    }
}
