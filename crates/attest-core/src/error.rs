//! Error types for attestation primitives
//!
//! Each collaborator has its own error enum. `PlacementError` wraps them with
//! the operation that failed so the gateway can log a single line carrying the
//! full chain of causes.

use thiserror::Error;

/// Errors from a [`crate::TokenStore`]
#[derive(Error, Debug)]
pub enum TokenError {
    /// Token failed verification (bad signature, expired, wrong issuer or
    /// audience, unknown opaque value)
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token could not be signed
    #[error("could not sign token: {0}")]
    Signing(String),

    /// Randomness source failed
    #[error("could not generate token: {0}")]
    Random(String),
}

impl TokenError {
    /// Whether the failure is an invalid-token condition rather than a server fault
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, TokenError::InvalidToken(_))
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::InvalidToken("token is expired".into()),
            ErrorKind::ImmatureSignature => TokenError::InvalidToken("token is not yet valid".into()),
            ErrorKind::InvalidIssuer => TokenError::InvalidToken("invalid issuer".into()),
            ErrorKind::InvalidAudience => TokenError::InvalidToken("invalid audience".into()),
            ErrorKind::InvalidAlgorithm => TokenError::InvalidToken("invalid signing method".into()),
            _ => TokenError::InvalidToken(format!("could not parse token: {}", err)),
        }
    }
}

/// Errors from a [`crate::FileStore`]
#[derive(Error, Debug)]
pub enum FileStoreError {
    /// No entry at the path, or it was already consumed or expired
    #[error("file not found")]
    NotFound,

    /// Randomness source failed while generating a path
    #[error("could not generate id: {0}")]
    Random(String),

    /// Logical name cannot be used in a path
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
}

/// Errors from a [`crate::Transport`] or [`crate::Transformer`]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The identifier is not known to the transport backend
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Payload construction or signing failed
    #[error("could not create payload: {0}")]
    Payload(String),

    /// Payload could not be staged
    #[error("could not store payload: {0}")]
    Stage(#[from] FileStoreError),

    /// The push backend failed
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors from [`crate::PlacementService::place`]
#[derive(Error, Debug)]
pub enum PlacementError {
    /// Caller supplied an empty identifier
    #[error("empty identifier")]
    EmptyIdentifier,

    /// Identifier transformation failed
    #[error("could not transform identifier: {0}")]
    Transform(#[source] TransportError),

    /// Token issuance failed
    #[error("could not create token: {0}")]
    Token(#[source] TokenError),

    /// Placement path could not be generated
    #[error("could not generate path: {0}")]
    Path(String),

    /// The transport failed to place the token
    #[error("could not place token: {0}")]
    Place(#[source] TransportError),
}

impl PlacementError {
    /// Whether the caller is at fault (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlacementError::EmptyIdentifier
                | PlacementError::Transform(TransportError::InvalidIdentifier(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(PlacementError::EmptyIdentifier.is_client_error());
        assert!(PlacementError::Transform(TransportError::InvalidIdentifier("X".into())).is_client_error());
        assert!(!PlacementError::Transform(TransportError::Backend("down".into())).is_client_error());
        assert!(!PlacementError::Place(TransportError::InvalidIdentifier("X".into())).is_client_error());
        assert!(!PlacementError::Token(TokenError::Signing("bad key".into())).is_client_error());
    }

    #[test]
    fn test_error_context_chain() {
        let err = PlacementError::Place(TransportError::Stage(FileStoreError::NotFound));
        assert_eq!(err.to_string(), "could not place token: could not store payload: file not found");
    }

    #[test]
    fn test_invalid_token_kind() {
        assert!(TokenError::InvalidToken("expired".into()).is_invalid_token());
        assert!(!TokenError::Random("rng".into()).is_invalid_token());
    }
}
