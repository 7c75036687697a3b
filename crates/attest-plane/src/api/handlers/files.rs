//! Staged file handler

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, Method},
    response::IntoResponse,
};
use std::sync::Arc;

use attest_core::FileStoreError;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Serve a staged file
///
/// GET /v1/attest/files/*path consumes the file; HEAD only checks it.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = if method == Method::HEAD {
        state.files.peek(&path).await
    } else {
        state.files.get(&path).await
    };

    let data: Bytes = result.map_err(|e| match e {
        FileStoreError::NotFound => ApiError::NotFound(format!("attest files: {}: file not found", path)),
        other => ApiError::Internal(format!("attest files: {}: {}", path, other)),
    })?;

    Ok(([(CONTENT_TYPE, "application/octet-stream")], data))
}
