//! Error types for scenario validation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("{step}: unexpected status {status} (expected one of {expected:?})")]
    UnexpectedStatus {
        step: String,
        status: u16,
        expected: Vec<u16>,
    },

    #[error("{step}: missing precondition: {missing}")]
    MissingPrecondition { step: String, missing: String },

    #[error("Timeout waiting for {what} after {attempts} attempts")]
    PollTimeout { what: String, attempts: u32 },

    #[error("Group aborted: {0}")]
    GroupAborted(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    pub fn missing(step: &str, missing: &str) -> Self {
        E2eError::MissingPrecondition {
            step: step.to_string(),
            missing: missing.to_string(),
        }
    }

    pub fn unexpected(step: &str, status: u16, expected: &[u16]) -> Self {
        E2eError::UnexpectedStatus {
            step: step.to_string(),
            status,
            expected: expected.to_vec(),
        }
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
