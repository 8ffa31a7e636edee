//! Verdict Engine
//!
//! Per test case, actual stdout and the rendered expected value are trimmed
//! and compared for exact string equality. Per submission, verdicts are
//! folded in declared order by a [`Grader`] that stops at the first failure
//! unless the [`GradingPolicy`] asks for the full suite.

use serde::{Deserialize, Serialize};

use crate::model::SubmissionStatus;
use crate::sandbox::ExecutionResult;

/// Output entry recorded for a timed-out test case
pub const TIME_LIMIT_ENTRY: &str = "Time Limit Exceeded";

/// Outcome classification of one test-case run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Passed,
    Failed,
    Timeout,
    RuntimeError,
    Error,
}

impl VerdictKind {
    /// Submission status a verdict of this kind produces
    pub fn status(&self) -> SubmissionStatus {
        match self {
            VerdictKind::Passed => SubmissionStatus::Accepted,
            VerdictKind::Timeout => SubmissionStatus::TimeLimitExceeded,
            VerdictKind::Error => SubmissionStatus::Error,
            VerdictKind::Failed | VerdictKind::RuntimeError => SubmissionStatus::WrongAnswer,
        }
    }
}

/// Verdict for one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub kind: VerdictKind,
    /// Trimmed program output, or captured diagnostics when the run failed
    pub actual: String,
    /// Trimmed expected text
    pub expected: String,
}

impl Verdict {
    /// Classify one execution result against the expected text
    pub fn evaluate(result: &ExecutionResult, expected: &str) -> Self {
        let expected = expected.trim().to_string();

        if result.timed_out {
            return Verdict {
                kind: VerdictKind::Timeout,
                actual: result.stdout.trim().to_string(),
                expected,
            };
        }

        if !result.success {
            let mut actual = result.combined_output();
            if actual.is_empty() {
                actual = match result.exit_code {
                    Some(code) => format!("process exited with status {}", code),
                    None => "process terminated".to_string(),
                };
            }
            return Verdict {
                kind: VerdictKind::RuntimeError,
                actual,
                expected,
            };
        }

        let actual = result.stdout.trim().to_string();
        let kind = if compare(&actual, &expected) {
            VerdictKind::Passed
        } else {
            VerdictKind::Failed
        };
        Verdict { kind, actual, expected }
    }

    /// A pipeline failure that aborts the submission
    pub fn error(message: impl Into<String>) -> Self {
        Verdict {
            kind: VerdictKind::Error,
            actual: message.into(),
            expected: String::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.kind == VerdictKind::Passed
    }

    /// Text persisted in the submission's output list
    pub fn output_entry(&self) -> String {
        match self.kind {
            VerdictKind::Passed => self.actual.clone(),
            VerdictKind::Failed => format!("Expected: {}, Got: {}", self.expected, self.actual),
            VerdictKind::Timeout => TIME_LIMIT_ENTRY.to_string(),
            VerdictKind::RuntimeError => format!("Execution Error: {}", self.actual),
            VerdictKind::Error => self.actual.clone(),
        }
    }
}

/// Exact comparison after trimming surrounding whitespace
pub fn compare(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

/// How a submission's verdicts are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingPolicy {
    /// Stop at the first non-passing test case
    pub stop_on_first_failure: bool,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        GradingPolicy {
            stop_on_first_failure: true,
        }
    }
}

/// Terminal status and output of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeOutcome {
    pub status: SubmissionStatus,
    pub output: Vec<String>,
}

impl JudgeOutcome {
    /// Submission-level `Error` with a single message entry
    pub fn error(message: impl Into<String>) -> Self {
        JudgeOutcome {
            status: SubmissionStatus::Error,
            output: vec![message.into()],
        }
    }
}

/// Folds per-test verdicts into a [`JudgeOutcome`]
#[derive(Debug)]
pub struct Grader {
    policy: GradingPolicy,
    output: Vec<String>,
    first_failure: Option<SubmissionStatus>,
    aborted: Option<String>,
}

impl Grader {
    pub fn new(policy: GradingPolicy) -> Self {
        Grader {
            policy,
            output: Vec::new(),
            first_failure: None,
            aborted: None,
        }
    }

    /// Record the next verdict; returns whether another test case should run
    pub fn record(&mut self, verdict: &Verdict) -> bool {
        if verdict.kind == VerdictKind::Error {
            self.aborted = Some(verdict.output_entry());
            return false;
        }

        self.output.push(verdict.output_entry());
        if !verdict.passed() && self.first_failure.is_none() {
            self.first_failure = Some(verdict.kind.status());
            return !self.policy.stop_on_first_failure;
        }
        true
    }

    /// Number of entries recorded so far
    pub fn recorded(&self) -> usize {
        self.output.len()
    }

    pub fn finish(self) -> JudgeOutcome {
        if let Some(message) = self.aborted {
            return JudgeOutcome::error(message);
        }
        JudgeOutcome {
            status: self.first_failure.unwrap_or(SubmissionStatus::Accepted),
            output: self.output,
        }
    }
}
