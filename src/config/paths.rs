//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GEEKJUDGE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("geekjudge"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("geekjudge"))
                .unwrap_or_else(|| PathBuf::from(".geekjudge"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("GEEKJUDGE_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}

/// Get the state directory
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GEEKJUDGE_STATE_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .map(|d| d.join("geekjudge"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".local").join("share").join("geekjudge"))
                .unwrap_or_else(|| PathBuf::from(".geekjudge"))
        })
}

/// Default scratch workspace for this process.
///
/// Keyed by pid so concurrent workers on one host never share files.
pub fn workspace_dir() -> PathBuf {
    state_dir()
        .join("workspace")
        .join(format!("worker-{}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let _ = config_dir();
        assert!(config_path().to_string_lossy().ends_with(".json") || std::env::var("GEEKJUDGE_CONFIG").is_ok());
    }

    #[test]
    fn test_workspace_is_per_process() {
        let dir = workspace_dir();
        assert_eq!(
            dir.file_name().and_then(|n| n.to_str()),
            Some(format!("worker-{}", std::process::id()).as_str())
        );
    }
}
