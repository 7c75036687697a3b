//! Gateway Tests
//!
//! Drive the full router in-process: placement, staged file serving, and the
//! bearer middleware, with a transport that stages the token instead of
//! talking to an MDM.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    routing::get,
    Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use attest_core::{
    FileStore, JwtTokenStore, MemoryFileStore, MemoryTokenStore, PlacementService, TokenStore, Transformer, Transport,
    TransportError,
};
use attest_plane::{create_router, protect, AppState, GatewayConfig};

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Debug, Clone)]
struct Placed {
    token: String,
    identifier: String,
    path: String,
    staged: String,
}

/// Stages the raw token as a file, the way the MDM transport stages a package
struct StagingTransport {
    files: Arc<dyn FileStore>,
    placed: Mutex<Vec<Placed>>,
}

impl StagingTransport {
    fn new(files: Arc<dyn FileStore>) -> Self {
        Self {
            files,
            placed: Mutex::new(Vec::new()),
        }
    }

    fn placed(&self) -> Vec<Placed> {
        self.placed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StagingTransport {
    async fn place(&self, token: &str, identifier: &str, path: &str) -> Result<(), TransportError> {
        let staged = self.files.put("token", Bytes::from(token.to_string())).await?;
        self.placed.lock().unwrap().push(Placed {
            token: token.into(),
            identifier: identifier.into(),
            path: path.into(),
            staged,
        });
        Ok(())
    }

    fn transformer(&self) -> Option<&dyn Transformer> {
        Some(self)
    }
}

#[async_trait]
impl Transformer for StagingTransport {
    async fn transform(&self, identifier: &str) -> Result<String, TransportError> {
        match identifier {
            "UNKNOWN" => Err(TransportError::InvalidIdentifier(identifier.into())),
            "BROKEN" => Err(TransportError::Backend("mdm unavailable".into())),
            _ => Ok(format!("udid-{}", identifier)),
        }
    }
}

struct Harness {
    app: Router,
    state: Arc<AppState>,
    transport: Arc<StagingTransport>,
}

fn harness_with(tokens: Arc<dyn TokenStore>, config: GatewayConfig) -> Harness {
    let files: Arc<dyn FileStore> = Arc::new(MemoryFileStore::new(100, Duration::from_secs(60)));
    let transport = Arc::new(StagingTransport::new(files.clone()));
    let placement = PlacementService::new(tokens, transport.clone());
    let state = Arc::new(AppState::new(placement, files, config));

    Harness {
        app: create_router(state.clone()),
        state,
        transport,
    }
}

fn harness() -> Harness {
    harness_with(
        Arc::new(MemoryTokenStore::new(100, Duration::from_secs(60))),
        GatewayConfig::default(),
    )
}

fn place_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/v1/attest/place")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn file_request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(format!("/v1/attest/files/{}", path))
        .body(Body::empty())
        .unwrap()
}

fn hello_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/v1/attest/hello");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_ok() {
    let h = harness();
    let response = h
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
async fn test_place_returns_path_and_issues_token() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(place_request(r#"{"identifier":"C02XYZ"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let path = body["path"].as_str().unwrap().to_string();
    assert!(path.starts_with("/tmp/"));

    let placed = h.transport.placed();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].identifier, "udid-C02XYZ");
    assert_eq!(placed[0].path, path);

    let identifier = h.state.tokens.authenticate(&placed[0].token).await.unwrap();
    assert_eq!(identifier, "udid-C02XYZ");
}

#[tokio::test]
async fn test_place_rejects_empty_identifier() {
    for body in [r#"{"identifier":""}"#, "{}"] {
        let h = harness();
        let response = h.app.clone().oneshot(place_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"code": 400, "description": "Bad Request"}));
        assert!(h.transport.placed().is_empty());
    }
}

#[tokio::test]
async fn test_place_rejects_malformed_json() {
    let h = harness();
    let response = h.app.clone().oneshot(place_request("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], 400);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/attest/place")
        .body(Body::from(r#"{"identifier":"C02XYZ"}"#))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(h.transport.placed().is_empty());
}

#[tokio::test]
async fn test_place_unknown_identifier_is_client_error() {
    let h = harness();
    let response = h.app.clone().oneshot(place_request(r#"{"identifier":"UNKNOWN"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_backend_failure_is_server_error() {
    let h = harness();
    let response = h.app.clone().oneshot(place_request(r#"{"identifier":"BROKEN"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"code": 500, "description": "Internal Server Error"})
    );
}

// =============================================================================
// Staged Files
// =============================================================================

#[tokio::test]
async fn test_head_peeks_and_get_consumes() {
    let h = harness();
    let path = h.state.files.put("payload.pkg", Bytes::from_static(b"pkg")).await.unwrap();

    let response = h.app.clone().oneshot(file_request(Method::HEAD, &path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/octet-stream");

    let response = h.app.clone().oneshot(file_request(Method::GET, &path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/octet-stream");
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"pkg"));

    let response = h.app.clone().oneshot(file_request(Method::GET, &path)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"code": 404, "description": "Not Found"}));
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let h = harness();
    for method in [Method::HEAD, Method::GET] {
        let response = h.app.clone().oneshot(file_request(method, "nope/payload.pkg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

// =============================================================================
// Bearer Middleware
// =============================================================================

#[tokio::test]
async fn test_malformed_authorization_never_reaches_handler() {
    let h = harness();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let guarded = Router::new().route(
        "/guarded",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "reached"
            }
        }),
    );
    let app = protect(guarded, h.state.clone()).with_state(h.state.clone());

    for value in [None, Some(""), Some("Bearer"), Some("Basic xyz"), Some("Bearer a b")] {
        let mut builder = Request::builder().uri("/guarded");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "header {:?}", value);
        assert_eq!(body_json(response).await["code"], 400);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_token_is_server_error_by_default() {
    let h = harness();
    let response = h.app.clone().oneshot(hello_request(Some("Bearer not-a-token"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], 500);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized_when_strict() {
    let h = harness_with(
        Arc::new(MemoryTokenStore::new(100, Duration::from_secs(60))),
        GatewayConfig {
            strict_auth_status: true,
        },
    );
    let response = h.app.clone().oneshot(hello_request(Some("Bearer not-a-token"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"code": 401, "description": "Unauthorized"}));
}

#[tokio::test]
async fn test_valid_token_reaches_handler_with_identifier() {
    let h = harness();
    let token = h.state.tokens.issue("device-1").await.unwrap();

    let response = h
        .app
        .clone()
        .oneshot(hello_request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"msg": "Hello, device-1!"}));
}

// =============================================================================
// End to End
// =============================================================================

/// Place a token, fetch the staged payload once, and use the token it carries
#[tokio::test]
async fn test_place_fetch_and_authenticate() {
    let tokens: Arc<dyn TokenStore> =
        Arc::new(JwtTokenStore::new(b"0123456789abcdef0123456789abcdef", Duration::from_secs(60)));
    let h = harness_with(tokens, GatewayConfig::default());

    let response = h
        .app
        .clone()
        .oneshot(place_request(r#"{"identifier":"C02ABC"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let placed = h.transport.placed();
    assert_eq!(placed.len(), 1);

    let response = h
        .app
        .clone()
        .oneshot(file_request(Method::GET, &placed[0].staged))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert_eq!(token, placed[0].token);

    let response = h
        .app
        .clone()
        .oneshot(file_request(Method::GET, &placed[0].staged))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = h
        .app
        .clone()
        .oneshot(hello_request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"msg": "Hello, udid-C02ABC!"}));
}
