//! # Attest Core
//!
//! Core primitives for proving that a managed macOS device has root-level
//! control. The server never trusts what the device says about itself: it
//! issues a token, ships it inside a signed installer package through the MDM,
//! and only accepts the token back once the root-level installer has written
//! it to a path the server chose.
//!
//! ## Key Concepts
//!
//! - **Token store**: issues and authenticates short-lived tokens bound to one
//!   identifier (stateless JWT or stateful in-memory)
//! - **File store**: ephemeral, randomly addressed, TTL-bound payload staging
//! - **Transport**: the push channel that places a token on a device
//! - **Placement**: transform → issue → choose path → push
//!
//! ## Invariants
//!
//! 1. A token resolves to exactly one identifier or fails as invalid
//! 2. Staged entries are consumed at most once and expire on schedule, even
//!    when peeked repeatedly
//! 3. An empty identifier is rejected before any side effect

pub mod error;
pub mod filestore;
pub mod placement;
pub mod random;
pub mod token;
pub mod transport;

pub use error::{FileStoreError, PlacementError, TokenError, TransportError};
pub use filestore::{FileStore, MemoryFileStore};
pub use placement::PlacementService;
pub use token::{JwtTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{Transformer, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
