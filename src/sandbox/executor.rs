//! Common executor trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Request to run one synthesized program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language id as stored on the submission; selects the toolchain
    pub language: String,
    /// Complete program text
    pub source: String,
    /// Wall-clock ceiling
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(50)
}

impl ExecutionRequest {
    /// Create a new execution request
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        ExecutionRequest {
            language: language.into(),
            source: source.into(),
            timeout: default_timeout(),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of running a program to completion, failure or timeout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the program exited with status zero
    pub success: bool,
    /// Exit code (absent when the run was killed)
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Execution time
    #[serde(with = "humantime_serde")]
    pub execution_time: Duration,
    /// Was execution terminated due to timeout?
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(stdout: impl Into<String>, execution_time: Duration) -> Self {
        ExecutionResult {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
            execution_time,
            timed_out: false,
        }
    }

    /// Create a failure result
    pub fn failure(
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: i32,
        execution_time: Duration,
    ) -> Self {
        ExecutionResult {
            success: false,
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            execution_time,
            timed_out: false,
        }
    }

    /// Create a timeout result
    pub fn timeout(partial_stdout: String, partial_stderr: String, timeout: Duration) -> Self {
        ExecutionResult {
            success: false,
            exit_code: None,
            stdout: partial_stdout,
            stderr: partial_stderr,
            execution_time: timeout,
            timed_out: true,
        }
    }

    /// Get combined output
    pub fn combined_output(&self) -> String {
        let mut output = String::new();
        if !self.stdout.trim().is_empty() {
            output.push_str(self.stdout.trim_end());
        }
        if !self.stderr.trim().is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(self.stderr.trim_end());
        }
        output
    }
}

/// Trait for code execution backends
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Get the executor name
    fn name(&self) -> &str;

    /// Run one program.
    ///
    /// `Ok` covers every run that started, including timeouts and non-zero
    /// exits; `Err` means the program could not be launched at all.
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_request() {
        let req = ExecutionRequest::new("Python", "print(1)").with_timeout(Duration::from_secs(5));
        assert_eq!(req.language, "Python");
        assert_eq!(req.source, "print(1)");
        assert_eq!(req.timeout, Duration::from_secs(5));
        assert_eq!(ExecutionRequest::new("Cpp", "").timeout, Duration::from_secs(50));
    }

    #[test]
    fn test_execution_result() {
        let success = ExecutionResult::success("0,1\n", Duration::from_millis(300));
        assert!(success.success);
        assert!(!success.timed_out);

        let timeout = ExecutionResult::timeout(String::new(), String::new(), Duration::from_secs(50));
        assert!(!timeout.success);
        assert!(timeout.timed_out);
        assert_eq!(timeout.exit_code, None);
    }

    #[test]
    fn test_combined_output() {
        let result = ExecutionResult::failure(
            "Runtime Error: ZeroDivisionError: division by zero\n",
            "Traceback...\n",
            1,
            Duration::from_millis(40),
        );
        assert_eq!(
            result.combined_output(),
            "Runtime Error: ZeroDivisionError: division by zero\nTraceback..."
        );
        let quiet = ExecutionResult::failure("", "segfault\n", 139, Duration::ZERO);
        assert_eq!(quiet.combined_output(), "segfault");
    }
}
