//! Server configuration
//!
//! Read from `ATTEST_*` environment variables. TLS is expected to be
//! terminated in front of this server: macOS only installs packages fetched
//! over HTTPS, so `ATTEST_PUBLIC_URL` must be an `https://` URL in production.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Minimum HMAC key size for JWT tokens (256 bits)
pub const MIN_HMAC_KEY_LEN: usize = 32;

/// Upper bound for token and file lifetimes (one year)
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("could not create MDM client: {0}")]
    Mdm(#[from] attest_mdm::MdmError),
}

/// Token store strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreKind {
    /// Stateless HMAC-signed JWTs
    Jwt,
    /// Opaque tokens in an in-memory cache
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jwt" => Ok(TokenStoreKind::Jwt),
            "memory" | "mem" => Ok(TokenStoreKind::Memory),
            _ => Err(format!("unknown token store: {}", s)),
        }
    }
}

/// Attestation server configuration
#[derive(Debug, Clone)]
pub struct PlaneConfig {
    pub port: u16,
    pub token_store: TokenStoreKind,
    pub hmac_key: Option<Vec<u8>>,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub token_ttl: Duration,
    pub token_capacity: u64,
    pub single_use_tokens: bool,
    pub file_ttl: Duration,
    pub file_capacity: u64,
    /// Externally reachable base URL of this server
    pub public_url: String,
    pub mdm_url: String,
    pub mdm_token: String,
    pub mdm_cache_size: u64,
    /// `productsign` identity; required unless `allow_unsigned_packages`
    pub signing_identity: Option<String>,
    /// Ship unsigned packages, which macOS will not install through MDM
    pub allow_unsigned_packages: bool,
    pub keychain: Option<String>,
    /// Device directory tokens are written under
    pub placement_dir: String,
    pub strict_auth_status: bool,
}

impl PlaneConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let token_store: TokenStoreKind = parse_or(&get, "ATTEST_TOKEN_STORE", TokenStoreKind::Jwt)?;

        let hmac_key = match get("ATTEST_HMAC_KEY") {
            Some(encoded) => {
                let key = STANDARD.decode(encoded.trim()).map_err(|e| ConfigError::Invalid {
                    key: "ATTEST_HMAC_KEY",
                    reason: e.to_string(),
                })?;
                if key.len() < MIN_HMAC_KEY_LEN {
                    return Err(ConfigError::Invalid {
                        key: "ATTEST_HMAC_KEY",
                        reason: format!("key is {} bytes, need at least {}", key.len(), MIN_HMAC_KEY_LEN),
                    });
                }
                Some(key)
            }
            None if token_store == TokenStoreKind::Jwt => return Err(ConfigError::Missing("ATTEST_HMAC_KEY")),
            None => None,
        };

        let signing_identity = get("ATTEST_SIGNING_IDENTITY");
        let allow_unsigned_packages = parse_or(&get, "ATTEST_ALLOW_UNSIGNED_PACKAGES", false)?;
        if signing_identity.is_none() && !allow_unsigned_packages {
            return Err(ConfigError::Missing("ATTEST_SIGNING_IDENTITY"));
        }

        let audience = get("ATTEST_AUDIENCE")
            .map(|v| v.split(',').map(|a| a.trim().to_string()).filter(|a| !a.is_empty()).collect())
            .unwrap_or_default();

        Ok(Self {
            port: parse_or(&get, "ATTEST_PORT", 8080)?,
            token_store,
            hmac_key,
            issuer: get("ATTEST_ISSUER"),
            audience,
            token_ttl: parse_ttl(&get, "ATTEST_TOKEN_TTL_SECS", 900)?,
            token_capacity: parse_or(&get, "ATTEST_TOKEN_CAPACITY", 10_000)?,
            single_use_tokens: parse_or(&get, "ATTEST_SINGLE_USE_TOKENS", false)?,
            file_ttl: parse_ttl(&get, "ATTEST_FILE_TTL_SECS", 60)?,
            file_capacity: parse_or(&get, "ATTEST_FILE_CAPACITY", 100)?,
            public_url: require("ATTEST_PUBLIC_URL")?.trim_end_matches('/').to_string(),
            mdm_url: require("ATTEST_MDM_URL")?,
            mdm_token: require("ATTEST_MDM_TOKEN")?,
            mdm_cache_size: parse_or(&get, "ATTEST_MDM_CACHE_SIZE", 1000)?,
            signing_identity,
            allow_unsigned_packages,
            keychain: get("ATTEST_KEYCHAIN"),
            placement_dir: get("ATTEST_PLACEMENT_DIR").unwrap_or_else(|| attest_core::placement::DEFAULT_PLACEMENT_DIR.into()),
            strict_auth_status: parse_or(&get, "ATTEST_STRICT_AUTH_STATUS", false)?,
        })
    }

    /// Public URL prefix under which staged files are served
    pub fn files_url_prefix(&self) -> String {
        format!("{}/v1/attest/files", self.public_url)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_ttl(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(get, key, default)?;
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be between 1 and {} seconds", MAX_TTL_SECS),
        });
    }
    Ok(Duration::from_secs(secs))
}
