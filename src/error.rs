//! Error types shared by the sources, targets and pipeline

use reqwest::StatusCode;

/// Errors raised by cardpress itself (I/O and parse errors travel as `anyhow`)
#[derive(thiserror::Error, Debug)]
pub enum CardpressError {
    #[error("Missing credential: set {0} in the environment or .env")]
    MissingCredential(&'static str),

    #[error("{service} API error [{status}]: {body}")]
    Api {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CardpressError {
    /// True when the error is an API response with the given status
    pub fn is_status(&self, expected: StatusCode) -> bool {
        matches!(self, CardpressError::Api { status, .. } if *status == expected)
    }
}
