//! Token placement handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Request to place a token on a device
#[derive(Debug, Deserialize, Serialize)]
pub struct PlaceRequest {
    /// Device identifier, usually its hardware serial number
    #[serde(default)]
    pub identifier: String,
}

/// Where the token was placed on the device
#[derive(Debug, Deserialize, Serialize)]
pub struct PlaceResponse {
    pub path: String,
}

/// Place a token on a device
///
/// POST /v1/attest/place
pub async fn place_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlaceRequest>, JsonRejection>,
) -> Result<Json<PlaceResponse>, ApiError> {
    let Json(request) = payload?;

    if request.identifier.is_empty() {
        return Err(ApiError::BadRequest("attest place: identifier must not be empty".into()));
    }

    let path = state.placement.place(&request.identifier).await?;

    Ok(Json(PlaceResponse { path }))
}
