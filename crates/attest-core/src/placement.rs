//! Token placement
//!
//! Ties token issuance and the push transport together:
//!
//! 1. Reject an empty identifier before any side effect
//! 2. Transform the identifier if the transport can
//! 3. Issue a token for the (transformed) identifier
//! 4. Pick a fresh random path on the device
//! 5. Ask the transport to write the token there
//! 6. Return the path so the device knows where to look

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::PlacementError;
use crate::random::{random_id, PATH_ID_SIZE};
use crate::token::TokenStore;
use crate::transport::Transport;

/// Default directory on the device where tokens are written
pub const DEFAULT_PLACEMENT_DIR: &str = "/tmp";

/// Places tokens on devices
#[derive(Clone)]
pub struct PlacementService {
    tokens: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
    placement_dir: String,
}

impl PlacementService {
    /// Create a new placement service
    pub fn new(tokens: Arc<dyn TokenStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            tokens,
            transport,
            placement_dir: DEFAULT_PLACEMENT_DIR.to_string(),
        }
    }

    /// Set the device directory under which token paths are generated
    pub fn with_placement_dir(mut self, dir: impl Into<String>) -> Self {
        let dir = dir.into();
        self.placement_dir = dir.trim_end_matches('/').to_string();
        self
    }

    /// Token store used to issue tokens
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Place a new token on the device named by `identifier`
    ///
    /// # Returns
    /// * `Ok(path)` - device path where the token will appear
    /// * `Err(PlacementError)` - see [`PlacementError::is_client_error`] for
    ///   which failures are the caller's fault
    pub async fn place(&self, identifier: &str) -> Result<String, PlacementError> {
        if identifier.is_empty() {
            return Err(PlacementError::EmptyIdentifier);
        }

        let identifier = match self.transport.transformer() {
            Some(transformer) => {
                let transformed = transformer
                    .transform(identifier)
                    .await
                    .map_err(PlacementError::Transform)?;
                debug!(identifier = %identifier, transformed = %transformed, "Transformed identifier");
                transformed
            }
            None => identifier.to_string(),
        };

        let token = self.tokens.issue(&identifier).await.map_err(PlacementError::Token)?;

        let id = random_id(PATH_ID_SIZE).map_err(|e| PlacementError::Path(e.to_string()))?;
        let path = format!("{}/{}", self.placement_dir, id);

        self.transport
            .place(&token, &identifier, &path)
            .await
            .map_err(PlacementError::Place)?;

        info!(
            identifier = %identifier,
            path = %path,
            transport = self.transport.description(),
            "Placed token"
        );

        Ok(path)
    }
}
