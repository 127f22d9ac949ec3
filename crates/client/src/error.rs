//! Error types for the client crate.

use std::time::Duration;

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the control plane.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-success response from the control plane.
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    /// A 401 challenge the configured scheme cannot answer.
    #[error("unusable auth challenge: {reason}")]
    AuthChallenge { reason: String },

    /// Request body cannot be replayed for the authorized attempt.
    #[error("request not repeatable: {reason}")]
    RequestNotRepeatable { reason: String },

    /// Goal-state wait cancelled through its cancel token.
    #[error("goal-state wait cancelled")]
    WaitCancelled,

    /// Goal-state wait exceeded its wall-clock deadline.
    #[error("goal-state wait gave up after {waited_secs}s")]
    DeadlineExceeded { waited_secs: u64 },

    /// Goal-state wait used up its round budget.
    #[error("goal-state wait used all {rounds} rounds without reaching goal version {goal_version}")]
    RoundsExhausted { rounds: u32, goal_version: i64 },

    /// HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Create an API error.
    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    /// Create an auth challenge error.
    pub fn auth_challenge(reason: impl Into<String>) -> Self {
        Self::AuthChallenge {
            reason: reason.into(),
        }
    }

    /// Create a request-not-repeatable error.
    pub fn request_not_repeatable(reason: impl Into<String>) -> Self {
        Self::RequestNotRepeatable {
            reason: reason.into(),
        }
    }

    /// Create a deadline-exceeded error.
    pub const fn deadline_exceeded(waited: Duration) -> Self {
        Self::DeadlineExceeded {
            waited_secs: waited.as_secs(),
        }
    }

    /// Create a rounds-exhausted error.
    pub const fn rounds_exhausted(rounds: u32, goal_version: i64) -> Self {
        Self::RoundsExhausted {
            rounds,
            goal_version,
        }
    }
}
