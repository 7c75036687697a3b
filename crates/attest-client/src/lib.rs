//! Attestation Retrieval Client
//!
//! Device-side half of the attestation flow. The client asks the gateway to
//! place a token for this machine's serial number, then waits for the MDM to
//! deposit that token at the returned root-only path and reads it back.
//!
//! ```no_run
//! # async fn run() -> Result<(), attest_client::ClientError> {
//! use std::time::Duration;
//! use attest_client::TokenClient;
//!
//! let client = TokenClient::new()?;
//! let token = client
//!     .get_token("https://attest.example.com/v1/attest/place", Duration::from_secs(300))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Reading the token file requires root, since the installer writes it `0600 root:wheel`.

pub mod backoff;
pub mod client;
pub mod error;
pub mod serial;

pub use backoff::Backoff;
pub use client::{set_token, TokenClient, DEFAULT_GRACE_PERIOD};
pub use error::ClientError;
pub use serial::{FixedSerial, IoregSerial, SerialSource};
