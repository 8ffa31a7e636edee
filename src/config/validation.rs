//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;
use std::time::Duration;

use super::types::Config;
use crate::model::Language;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_storage_config(config, result);
    result = validate_queue_config(config, result);
    result = validate_sandbox_config(config, result);
    result = validate_worker_config(config, result);

    result
}

fn validate_storage_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.storage.postgres {
        None => {
            result = result.with_error(
                ValidationIssue::new("storage.postgres", "PostgreSQL is not configured")
                    .with_suggestion("Set DATABASE_URL environment variable or configure storage.postgres"),
            );
        }
        Some(ref pg) if pg.url.expose_secret().is_empty() => {
            result = result.with_error(
                ValidationIssue::new("storage.postgres.url", "Database URL is empty")
                    .with_suggestion("Set DATABASE_URL"),
            );
        }
        Some(ref pg) if pg.max_connections == 0 => {
            result = result.with_error(ValidationIssue::new(
                "storage.postgres.max_connections",
                "Pool needs at least one connection",
            ));
        }
        Some(_) => {}
    }

    result
}

fn validate_queue_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.queue.name.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("queue.name", "Queue name is empty")
                .with_suggestion("Set JUDGE_QUEUE or queue.name (the intake API pushes to \"jobQueue\")"),
        );
    }
    if !config.queue.url.expose_secret().starts_with("redis") {
        result = result.with_error(
            ValidationIssue::new("queue.url", "Queue URL must use the redis:// or rediss:// scheme")
                .with_suggestion("Set REDIS_URL"),
        );
    }

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let sandbox = &config.sandbox;

    if sandbox.timeout.is_zero() {
        result = result.with_error(
            ValidationIssue::new("sandbox.timeout", "Timeout must be greater than zero")
                .with_suggestion("Use a humantime duration such as \"50s\""),
        );
    }
    if sandbox.memory_bytes().is_none() {
        result = result.with_error(
            ValidationIssue::new(
                "sandbox.memory_limit",
                format!("Cannot parse memory limit: {}", sandbox.memory_limit),
            )
            .with_suggestion("Use a size such as \"256m\" or \"1g\""),
        );
    }
    if !(sandbox.cpu_limit.is_finite() && sandbox.cpu_limit > 0.0) {
        result = result.with_error(ValidationIssue::new(
            "sandbox.cpu_limit",
            "CPU limit must be a positive number",
        ));
    }
    if sandbox.pids_limit <= 0 {
        result = result.with_error(ValidationIssue::new(
            "sandbox.pids_limit",
            "Process limit must be positive",
        ));
    }
    if sandbox.max_output_bytes == 0 {
        result = result.with_error(ValidationIssue::new(
            "sandbox.max_output_bytes",
            "Output limit must be positive",
        ));
    }
    for language in sandbox.images.keys() {
        if language.parse::<Language>().is_err() {
            result = result.with_warning(
                ValidationIssue::new(
                    format!("sandbox.images.{}", language),
                    "Image override for a language without synthesis support is never used",
                )
                .with_suggestion("Use one of: Python, Javascript, Cpp"),
            );
        }
    }
    if let Some(ref workspace) = sandbox.workspace {
        if workspace.is_relative() {
            result = result.with_warning(
                ValidationIssue::new(
                    "sandbox.workspace",
                    format!("Relative workspace {} is resolved against the working directory", workspace.display()),
                )
                .with_suggestion("Docker bind mounts need an absolute host path"),
            );
        }
    }

    result
}

fn validate_worker_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.worker.backoff < Duration::from_secs(1) {
        result = result.with_error(
            ValidationIssue::new("worker.backoff", "Backoff must be at least one second")
                .with_suggestion("Use \"5s\""),
        );
    }
    if !config.worker.stop_on_first_failure {
        result = result.with_warning(ValidationIssue::new(
            "worker.stop_on_first_failure",
            "Full-suite grading runs every test case even after a failure",
        ));
    }

    result
}
