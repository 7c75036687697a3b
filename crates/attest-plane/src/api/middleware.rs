//! Bearer attestation middleware
//!
//! Checks `Authorization: Bearer <token>`, resolves the token to a device
//! identifier, and hands the request on with an [`AttestedIdentifier`]
//! extension. The wrapped handler writes the response; the middleware only
//! writes one when authentication fails.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Identifier of the device that presented a valid attestation token
///
/// Available to protected handlers as `Extension<AttestedIdentifier>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedIdentifier(pub String);

/// Extract the token from an `Authorization` header
///
/// The header must be exactly `Bearer <token>` with a single space.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = match headers.get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::BadRequest("attest middleware: invalid header".into()))?,
        None => "",
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(token),
        _ => Err(ApiError::BadRequest("attest middleware: invalid header".into())),
    }
}

/// Require a valid attestation token
///
/// Use with `axum::middleware::from_fn_with_state`, or wrap a router with [`protect`].
pub async fn require_attestation(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.to_string();

    let identifier = state.tokens.authenticate(&token).await.map_err(|e| {
        let message = format!("attest middleware: could not get identifier: {}", e);
        if e.is_invalid_token() && state.config.strict_auth_status {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Internal(message)
        }
    })?;

    debug!(identifier = %identifier, "Attestation token accepted");
    request.extensions_mut().insert(AttestedIdentifier(identifier));

    Ok(next.run(request).await)
}

/// Put every route of `routes` behind [`require_attestation`]
pub fn protect(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router<Arc<AppState>> {
    routes.route_layer(middleware::from_fn_with_state(state, require_attestation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token_parsed() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn test_malformed_headers_rejected() {
        for value in [None, Some(""), Some("Bearer"), Some("Basic xyz"), Some("Bearer a b"), Some("bearer abc")] {
            let err = bearer_token(&headers(value)).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{:?} should be rejected", value);
        }
    }

    #[test]
    fn test_empty_token_passes_through_to_verification() {
        // "Bearer " splits into two parts; the empty token then fails verification
        assert_eq!(bearer_token(&headers(Some("Bearer "))).unwrap(), "");
    }
}
