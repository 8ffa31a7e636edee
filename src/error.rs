//! Error types for GeekJudge

use thiserror::Error;

/// Result type alias using GeekJudge's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for GeekJudge
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Work queue error
    #[error("Queue error: {0}")]
    Queue(String),

    /// Docker/container error
    #[error("Container error: {0}")]
    Container(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Submission or problem lookup failed
    #[error("{0} not found")]
    NotFound(String),

    /// No marshaling/synthesis support for the submitted language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Problem data violates an authoring precondition
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// A test value does not match its declared semantic type
    #[error("Cannot marshal value: {0}")]
    Marshal(String),

    /// Program synthesis failed
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Submission status would move backwards
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is retryable by the consumer loop's backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Queue(_))
    }

    /// Check if error came from the persistence layer.
    ///
    /// The worker cannot guarantee a terminal write once persistence fails,
    /// so these errors end the process and leave recovery to the supervisor.
    /// A row that was read but could not be decoded is a data error instead.
    pub fn is_persistence(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => false,
            Error::Database(_) => true,
            _ => false,
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Queue(err.to_string())
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(err: bollard::errors::Error) -> Self {
        Error::Container(err.to_string())
    }
}
