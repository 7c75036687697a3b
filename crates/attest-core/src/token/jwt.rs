//! Stateless JWT token store
//!
//! Tokens are HS256-signed JWTs. The subject carries the identifier; `nbf` is
//! backdated to tolerate clock drift between the issuing and verifying hosts.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::TokenStore;
use crate::error::TokenError;

/// Allowed clock drift between issuer and verifier
pub const CLOCK_SKEW: Duration = Duration::from_secs(15);

/// Claims written into issued tokens
#[derive(Debug, Serialize)]
struct IssuedClaims<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<&'a str>,
    #[serde(skip_serializing_if = "no_audience")]
    aud: &'a [String],
    sub: &'a str,
    iat: i64,
    nbf: i64,
    exp: i64,
}

fn no_audience(aud: &&[String]) -> bool {
    aud.is_empty()
}

/// Claims read back from a verified token
///
/// Issuer, audience, and time claims are checked by [`Validation`] against the
/// raw payload, so only the subject is needed here.
#[derive(Debug, Deserialize)]
struct VerifiedClaims {
    sub: String,
}

/// Stateless token store using HMAC-signed JWTs
pub struct JwtTokenStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    audience: Vec<String>,
    duration: Duration,
}

impl JwtTokenStore {
    /// Create a new JWT token store
    ///
    /// `key` should be at least 256 bits. Tokens are valid for `duration`
    /// after issuance.
    pub fn new(key: &[u8], duration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            issuer: None,
            audience: Vec::new(),
            duration,
        }
    }

    /// Set the issuer written into tokens and required on verification
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.issuer = if issuer.is_empty() { None } else { Some(issuer) };
        self
    }

    /// Set the audiences written into tokens; verification accepts any of them
    pub fn with_audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience.into_iter().filter(|a| !a.is_empty()).collect();
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        if self.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.audience);
        }

        validation
    }
}

#[async_trait]
impl TokenStore for JwtTokenStore {
    async fn issue(&self, identifier: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.duration.as_secs())
            .ok()
            .and_then(|duration| now.checked_add(duration))
            .ok_or_else(|| TokenError::Signing(format!("token duration out of range: {:?}", self.duration)))?;

        let claims = IssuedClaims {
            iss: self.issuer.as_deref(),
            aud: &self.audience,
            sub: identifier,
            iat: now,
            nbf: now - CLOCK_SKEW.as_secs() as i64,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    async fn authenticate(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<VerifiedClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| {
                debug!(error = %e, "JWT verification failed");
                TokenError::from(e)
            })?;

        Ok(data.claims.sub)
    }

    fn description(&self) -> &str {
        "stateless JWT token store"
    }
}
