//! Error types for the MDM transport

use thiserror::Error;

/// Result type for MDM operations
pub type Result<T> = std::result::Result<T, MdmError>;

/// Errors that can occur talking to the MDM or building payloads
#[derive(Error, Debug)]
pub enum MdmError {
    /// No enrolled device matches the serial
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// HTTP request failed
    #[error("could not complete request: {0}")]
    Request(String),

    /// MDM response could not be parsed or had an error status
    #[error("could not parse response: {0}")]
    Response(String),

    /// MDM reported an error in its response body
    #[error("mdm error: {0}")]
    Command(String),

    /// Payload package could not be built or signed
    #[error("could not build package: {0}")]
    Package(String),
}

impl From<reqwest::Error> for MdmError {
    fn from(err: reqwest::Error) -> Self {
        MdmError::Request(err.to_string())
    }
}

impl From<std::io::Error> for MdmError {
    fn from(err: std::io::Error) -> Self {
        MdmError::Package(err.to_string())
    }
}
