//! Client error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not get serial: {0}")]
    Serial(String),

    #[error("could not get serial: serial is empty")]
    EmptySerial,

    #[error("could not perform request: {0}")]
    Request(String),

    /// The gateway answered with a non-success status
    #[error("placement rejected: {code} {description}")]
    Rejected { code: u16, description: String },

    #[error("could not parse response: {0}")]
    Response(String),

    /// The token never appeared before the deadline
    #[error("could not get token: timed out after {elapsed:?}: {last}")]
    Timeout { elapsed: Duration, last: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}
