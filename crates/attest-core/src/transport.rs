//! Push transports
//!
//! A transport securely carries a token to a device and writes it to a path
//! chosen by the server. Implementers must make sure the token is never
//! readable by non-root users, in transit or once written to disk.

use async_trait::async_trait;

use crate::error::TransportError;

/// Places a token at a path on a device
#[async_trait]
pub trait Transport: Send + Sync {
    /// Place `token` at `path` on the device named by `identifier`
    async fn place(&self, token: &str, identifier: &str, path: &str) -> Result<(), TransportError>;

    /// Optional identifier transformation capability
    ///
    /// Transports that address devices by a backend-native id (e.g. an MDM
    /// UDID) return a transformer that maps client-given identifiers (e.g.
    /// serial numbers) into that space. Defaults to none, in which case the
    /// client-given identifier is used as-is.
    fn transformer(&self) -> Option<&dyn Transformer> {
        None
    }

    /// Short description of this transport (for logging)
    fn description(&self) -> &str {
        "transport"
    }
}

/// Maps a client-given identifier into a transport's native identifier space
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Transform `identifier`
    ///
    /// Returns [`TransportError::InvalidIdentifier`] when the backend does not
    /// know the identifier; any other error is a server-side failure.
    async fn transform(&self, identifier: &str) -> Result<String, TransportError>;
}
