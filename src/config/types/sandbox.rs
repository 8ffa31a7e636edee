//! Sandbox configuration types
//!
//! Resource limits and image selection for the Docker executor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Wall-clock ceiling for one test-case run
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Memory limit (e.g. "256m", "1g")
    #[serde(default = "default_memory")]
    pub memory_limit: String,
    /// CPU limit (number of CPUs)
    #[serde(default = "default_cpu")]
    pub cpu_limit: f64,
    /// Maximum processes inside the container
    #[serde(default = "default_pids")]
    pub pids_limit: i64,
    /// Maximum captured output per stream in bytes
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
    /// Scratch workspace root; defaults to a per-process directory
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    /// Image overrides keyed by language name
    #[serde(default)]
    pub images: HashMap<String, String>,
    /// Pull missing images on first use
    #[serde(default = "default_true")]
    pub pull_images: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            timeout: default_timeout(),
            memory_limit: default_memory(),
            cpu_limit: default_cpu(),
            pids_limit: default_pids(),
            max_output_bytes: default_max_output(),
            workspace: None,
            images: HashMap::new(),
            pull_images: true,
        }
    }
}

impl SandboxConfig {
    /// Memory limit in bytes, if it parses
    pub fn memory_bytes(&self) -> Option<i64> {
        parse_memory_limit(&self.memory_limit)
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(50)
}

fn default_memory() -> String {
    "256m".to_string()
}

fn default_cpu() -> f64 {
    1.0
}

fn default_pids() -> i64 {
    64
}

fn default_max_output() -> usize {
    64 * 1024
}

fn default_true() -> bool {
    true
}

/// Parse a memory limit string (e.g., "512m", "1g") to bytes
pub fn parse_memory_limit(limit: &str) -> Option<i64> {
    let limit = limit.trim().to_lowercase();
    let limit = limit.strip_suffix('b').unwrap_or(limit.as_str());
    let (num_str, multiplier) = match limit.chars().last()? {
        'g' => (&limit[..limit.len() - 1], 1024 * 1024 * 1024),
        'm' => (&limit[..limit.len() - 1], 1024 * 1024),
        'k' => (&limit[..limit.len() - 1], 1024),
        _ => (limit, 1),
    };
    let num: i64 = num_str.trim().parse().ok()?;
    if num <= 0 {
        return None;
    }
    num.checked_mul(multiplier)
}
