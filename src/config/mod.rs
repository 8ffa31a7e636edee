//! Configuration module - Modular configuration management
//!
//! Configuration is split into focused modules:
//! - types/mod.rs: Core configuration types (Config, WorkerConfig, LogConfig)
//! - types/queue.rs: Redis work queue configuration
//! - types/storage.rs: PostgreSQL configuration
//! - types/sandbox.rs: Sandbox limits and images
//! - io.rs: Configuration loading
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{Config, LogConfig, LogFormat, WorkerConfig};

pub use types::queue::QueueConfig;
pub use types::sandbox::{parse_memory_limit, SandboxConfig};
pub use types::storage::{PostgresConfig, StorageConfig};

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path};
pub use paths::{config_dir, config_path, state_dir, workspace_dir};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
