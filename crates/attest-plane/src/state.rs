//! Shared application state

use std::sync::Arc;
use tracing::{info, warn};

use attest_core::{FileStore, JwtTokenStore, MemoryFileStore, MemoryTokenStore, PlacementService, TokenStore};
use attest_mdm::{MdmTransport, MicroMdm, ProductSignBuilder};

use crate::config::{ConfigError, PlaneConfig, TokenStoreKind};

/// Gateway behavior switches
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Answer invalid bearer tokens with 401 instead of 500
    pub strict_auth_status: bool,
}

/// Application state shared across handlers
pub struct AppState {
    /// Places tokens on devices
    pub placement: PlacementService,
    /// Authenticates bearer tokens (same store the placement service issues from)
    pub tokens: Arc<dyn TokenStore>,
    /// Staged files served under `/v1/attest/files`
    pub files: Arc<dyn FileStore>,
    /// Gateway configuration
    pub config: GatewayConfig,
}

impl AppState {
    /// Create state from its parts
    pub fn new(placement: PlacementService, files: Arc<dyn FileStore>, config: GatewayConfig) -> Self {
        Self {
            tokens: placement.tokens().clone(),
            placement,
            files,
            config,
        }
    }

    /// Wire up token store, file store, MicroMDM, and the MDM transport from configuration
    pub fn from_config(config: &PlaneConfig) -> Result<Arc<Self>, ConfigError> {
        let tokens: Arc<dyn TokenStore> = match config.token_store {
            TokenStoreKind::Jwt => {
                let key = config.hmac_key.as_deref().ok_or(ConfigError::Missing("ATTEST_HMAC_KEY"))?;
                let mut store = JwtTokenStore::new(key, config.token_ttl).with_audience(config.audience.clone());
                if let Some(ref issuer) = config.issuer {
                    store = store.with_issuer(issuer.clone());
                }
                Arc::new(store)
            }
            TokenStoreKind::Memory => Arc::new(
                MemoryTokenStore::new(config.token_capacity, config.token_ttl)
                    .with_single_use(config.single_use_tokens),
            ),
        };

        let files: Arc<dyn FileStore> = Arc::new(MemoryFileStore::new(config.file_capacity, config.file_ttl));

        let mdm = MicroMdm::new(&config.mdm_url, &config.mdm_token, config.mdm_cache_size)?;

        let mut packages = ProductSignBuilder::new();
        match config.signing_identity {
            Some(ref identity) => packages = packages.with_signing_identity(identity.clone()),
            None => warn!("No signing identity configured; devices will refuse the unsigned payload packages"),
        }
        if let Some(ref keychain) = config.keychain {
            packages = packages.with_keychain(keychain.clone());
        }

        let transport = MdmTransport::new(
            Arc::new(mdm),
            files.clone(),
            Arc::new(packages),
            config.files_url_prefix(),
        );

        let placement =
            PlacementService::new(tokens.clone(), Arc::new(transport)).with_placement_dir(config.placement_dir.clone());

        info!(
            token_store = tokens.description(),
            files_url = %config.files_url_prefix(),
            mdm = %config.mdm_url,
            signed = config.signing_identity.is_some(),
            "Attestation state initialized"
        );

        Ok(Arc::new(Self::new(
            placement,
            files,
            GatewayConfig {
                strict_auth_status: config.strict_auth_status,
            },
        )))
    }
}
