//! Example protected handler

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AttestedIdentifier;

#[derive(Debug, Deserialize, Serialize)]
pub struct HelloResponse {
    pub msg: String,
}

/// Greet the attested device
///
/// GET /v1/attest/hello
pub async fn hello(Extension(AttestedIdentifier(identifier)): Extension<AttestedIdentifier>) -> Json<HelloResponse> {
    Json(HelloResponse {
        msg: format!("Hello, {}!", identifier),
    })
}
