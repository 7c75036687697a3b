//! Attestation Gateway
//!
//! HTTP front end for MDM-backed device attestation. A device asks for a
//! token to be placed, the MDM installs a package that writes the token to a
//! root-only path, and the device presents that token as a bearer credential.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `POST /v1/attest/place` - Place a token on the device named in the body
//! - `GET|HEAD /v1/attest/files/*path` - Fetch (GET, consuming) or peek (HEAD) a staged file
//! - `GET /v1/attest/hello` - Example route protected by bearer attestation
//!
//! Errors are returned as `{"code": <status>, "description": <reason>}`.

pub mod api;
pub mod config;
pub mod state;

pub use api::create_router;
pub use api::middleware::{protect, require_attestation, AttestedIdentifier};
pub use config::{ConfigError, PlaneConfig, TokenStoreKind};
pub use state::{AppState, GatewayConfig};
