//! Token stores
//!
//! A token store issues short-lived bearer tokens bound to one device
//! identifier and later resolves a presented token back to that identifier.
//!
//! - **JWT**: stateless, HMAC-signed claims. Any server holding the key can verify.
//! - **Memory**: stateful, 256-bit opaque values kept in a TTL-bound cache.
//!   Verification only works on the instance that issued the token.

pub mod jwt;
pub mod memory;

pub use jwt::JwtTokenStore;
pub use memory::MemoryTokenStore;

use async_trait::async_trait;

use crate::error::TokenError;

/// Issues and authenticates tokens bound to device identifiers
///
/// Implementations must be thread-safe; the gateway shares one store across
/// all requests.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Issue a new token for `identifier`
    async fn issue(&self, identifier: &str) -> Result<String, TokenError>;

    /// Authenticate `token` and return the identifier it was issued for
    ///
    /// # Returns
    /// * `Ok(identifier)` - token is valid
    /// * `Err(TokenError::InvalidToken)` - token failed verification
    /// * `Err(_)` - any other variant is a server-side failure
    async fn authenticate(&self, token: &str) -> Result<String, TokenError>;

    /// Short description of this store (for logging)
    fn description(&self) -> &str {
        "token store"
    }
}
