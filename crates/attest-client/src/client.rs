//! Token retrieval

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::backoff::{Backoff, DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_MULTIPLIER};
use crate::error::ClientError;
use crate::serial::{IoregSerial, SerialSource};

/// Time the MDM usually needs before the token can appear
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct PlaceRequest<'a> {
    identifier: &'a str,
}

#[derive(Deserialize)]
struct PlaceResponse {
    path: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    code: u16,
    description: String,
}

/// Requests token placement and waits for the token to arrive
pub struct TokenClient {
    http: reqwest::Client,
    serial: Arc<dyn SerialSource>,
    grace_period: Duration,
    initial_interval: Duration,
    max_interval: Duration,
}

impl TokenClient {
    /// Client reading the serial from ioreg, with default timings
    pub fn new() -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            serial: Arc::new(IoregSerial),
            grace_period: DEFAULT_GRACE_PERIOD,
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
        })
    }

    pub fn with_serial_source(mut self, serial: Arc<dyn SerialSource>) -> Self {
        self.serial = serial;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Set the first and largest polling intervals
    pub fn with_intervals(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max;
        self
    }

    /// Request a token placement at `url` and read the token once it lands
    ///
    /// `timeout` bounds the whole call from its start, grace period included.
    /// A timeout too large to represent as an instant means no deadline.
    /// The file is always read at least once after the grace period.
    pub async fn get_token(&self, url: &str, timeout: Duration) -> Result<String, ClientError> {
        let start = Instant::now();
        let deadline = start.checked_add(timeout);

        let serial = self.serial.serial().await?;
        if serial.is_empty() {
            return Err(ClientError::EmptySerial);
        }

        let path = self.request_placement(url, &serial).await?;
        info!(serial = %serial, path = %path, "Token placement requested");

        sleep(clip(self.grace_period, deadline, Instant::now())).await;

        let mut backoff = Backoff::new(self.initial_interval, DEFAULT_MULTIPLIER, self.max_interval);
        loop {
            let last = match read_token(&path).await {
                Ok(token) => {
                    info!(path = %path, elapsed = ?start.elapsed(), "Token retrieved");
                    return Ok(token);
                }
                Err(e) => e,
            };

            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                return Err(ClientError::Timeout {
                    elapsed: start.elapsed(),
                    last,
                });
            }

            let wait = clip(backoff.next_interval(), deadline, now);
            debug!(path = %path, error = %last, wait = ?wait, "Token not ready");
            sleep(wait).await;
        }
    }

    async fn request_placement(&self, url: &str, serial: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(url)
            .json(&PlaceRequest { identifier: serial })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let envelope = response.json::<ErrorEnvelope>().await.unwrap_or(ErrorEnvelope {
                code: status.as_u16(),
                description: status.canonical_reason().unwrap_or_default().to_string(),
            });
            return Err(ClientError::Rejected {
                code: envelope.code,
                description: envelope.description,
            });
        }

        let body: PlaceResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))?;

        Ok(body.path)
    }
}

/// Shorten `wait` so it ends no later than `deadline`
fn clip(wait: Duration, deadline: Option<Instant>, now: Instant) -> Duration {
    match deadline {
        Some(deadline) => wait.min(deadline.saturating_duration_since(now)),
        None => wait,
    }
}

/// Absent, unreadable, and empty files are all "not yet"
async fn read_token(path: &str) -> Result<String, String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("could not read token file: {}", e))?;
    if data.is_empty() {
        return Err("could not read token file: token file empty".into());
    }
    String::from_utf8(data).map_err(|e| format!("could not read token file: {}", e))
}

/// Attach `token` to `request` as a bearer credential
pub fn set_token(request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
    request.header(AUTHORIZATION, format!("Bearer {}", token))
}
