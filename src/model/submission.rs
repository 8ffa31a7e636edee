//! Submission records and their status lifecycle
//!
//! Pending → Processing → Accepted | Wrong Answer | Time Limit Exceeded | Error

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Submission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    Error,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::Processing => "Processing",
            SubmissionStatus::Accepted => "Accepted",
            SubmissionStatus::WrongAnswer => "Wrong Answer",
            SubmissionStatus::TimeLimitExceeded => "Time Limit Exceeded",
            SubmissionStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Accepted
                | SubmissionStatus::WrongAnswer
                | SubmissionStatus::TimeLimitExceeded
                | SubmissionStatus::Error
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// `Pending → Error` covers a pipeline failure before the processing
    /// mark was observed.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        match (self, next) {
            (SubmissionStatus::Pending, SubmissionStatus::Processing) => true,
            (SubmissionStatus::Pending, SubmissionStatus::Error) => true,
            (SubmissionStatus::Processing, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Statuses a submission may be in right before moving to `next`
    pub fn predecessors(next: SubmissionStatus) -> Vec<SubmissionStatus> {
        [SubmissionStatus::Pending, SubmissionStatus::Processing]
            .into_iter()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }

    /// Validate a transition, returning an error when it would move backwards
    pub fn transition(self, next: SubmissionStatus) -> Result<SubmissionStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(SubmissionStatus::Pending),
            "Processing" => Ok(SubmissionStatus::Processing),
            "Accepted" => Ok(SubmissionStatus::Accepted),
            "Wrong Answer" => Ok(SubmissionStatus::WrongAnswer),
            "Time Limit Exceeded" => Ok(SubmissionStatus::TimeLimitExceeded),
            "Error" => Ok(SubmissionStatus::Error),
            other => Err(Error::Internal(format!("Unknown submission status: {}", other))),
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's solution attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub problem_id: Uuid,
    /// Language as written by the intake API (may be unsupported)
    pub language: String,
    pub code: String,
    pub status: SubmissionStatus,
    /// Per-test results, or a single error message
    pub output: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Create a pending submission
    pub fn new(problem_id: Uuid, language: impl Into<String>, code: impl Into<String>) -> Self {
        Submission {
            id: Uuid::new_v4(),
            problem_id,
            language: language.into(),
            code: code.into(),
            status: SubmissionStatus::Pending,
            output: Vec::new(),
            submitted_at: Utc::now(),
        }
    }
}
