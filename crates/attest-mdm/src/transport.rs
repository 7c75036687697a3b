//! MDM-backed push transport
//!
//! Places a token by building a payload package around it, staging the
//! package in a file store, and asking the MDM to install it from the staged
//! URL. Devices are addressed by UDID; client-given serials are transformed
//! through the MDM.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use attest_core::{FileStore, Transformer, Transport, TransportError};

use crate::error::MdmError;
use crate::manifest::Manifest;
use crate::mdm::Mdm;
use crate::package::PackageBuilder;

/// Logical name under which payload packages are staged
pub const PAYLOAD_NAME: &str = "payload.pkg";

/// Transport that installs a token-writing package through an MDM
pub struct MdmTransport {
    mdm: Arc<dyn Mdm>,
    files: Arc<dyn FileStore>,
    packages: Arc<dyn PackageBuilder>,
    /// Public URL the file store is served under, without trailing slash
    url_prefix: String,
}

impl MdmTransport {
    /// Create a new MDM transport
    ///
    /// `url_prefix` is the externally reachable URL where `files` is served,
    /// e.g. `https://attest.example.com/v1/attest/files`. The device downloads
    /// the package from there, so it must be served over TLS.
    pub fn new(
        mdm: Arc<dyn Mdm>,
        files: Arc<dyn FileStore>,
        packages: Arc<dyn PackageBuilder>,
        url_prefix: impl Into<String>,
    ) -> Self {
        Self {
            mdm,
            files,
            packages,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for MdmTransport {
    async fn place(&self, token: &str, udid: &str, path: &str) -> Result<(), TransportError> {
        let package = self
            .packages
            .build(token, path)
            .await
            .map_err(|e| TransportError::Payload(e.to_string()))?;

        let staged = self.files.put(PAYLOAD_NAME, package.clone()).await?;
        let manifest = Manifest::new(&package, format!("{}/{}", self.url_prefix, staged));

        if let Err(e) = self.mdm.install_enterprise_application(udid, &manifest).await {
            // Discard the payload the device will never fetch
            if self.files.get(&staged).await.is_err() {
                warn!(path = %staged, "Staged payload already gone after failed install");
            }
            return Err(TransportError::Backend(format!("could not execute install command: {}", e)));
        }

        info!(udid = %udid, staged = %staged, mdm = self.mdm.description(), "Queued payload install");
        Ok(())
    }

    fn transformer(&self) -> Option<&dyn Transformer> {
        Some(self)
    }

    fn description(&self) -> &str {
        "MDM transport"
    }
}

#[async_trait]
impl Transformer for MdmTransport {
    async fn transform(&self, serial: &str) -> Result<String, TransportError> {
        self.mdm.serial_to_udid(serial).await.map_err(|e| match e {
            MdmError::DeviceNotFound(serial) => TransportError::InvalidIdentifier(serial),
            other => TransportError::Backend(format!("could not get UDID: {}", other)),
        })
    }
}
