//! `InstallEnterpriseApplication` manifests
//!
//! The manifest tells the device where to download the package and how to
//! check it: a list of SHA-256 hashes, one per fixed-size chunk.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Size of each hashed chunk (10 MiB)
pub const CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Asset kind for flat installer packages
pub const SOFTWARE_PACKAGE: &str = "software-package";

/// Install manifest referencing one package asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub items: Vec<ManifestItem>,
}

/// A manifest item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub assets: Vec<Asset>,
}

/// A downloadable asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: String,
    #[serde(rename = "sha256-size")]
    pub sha256_size: u64,
    pub sha256s: Vec<String>,
    pub url: String,
}

impl Manifest {
    /// Build a manifest for `package` served at `url`
    pub fn new(package: &[u8], url: impl Into<String>) -> Self {
        let sha256s = if package.is_empty() {
            vec![hex::encode(Sha256::digest(package))]
        } else {
            package
                .chunks(CHUNK_SIZE)
                .map(|chunk| hex::encode(Sha256::digest(chunk)))
                .collect()
        };

        Self {
            items: vec![ManifestItem {
                assets: vec![Asset {
                    kind: SOFTWARE_PACKAGE.to_string(),
                    sha256_size: CHUNK_SIZE as u64,
                    sha256s,
                    url: url.into(),
                }],
            }],
        }
    }

    /// URL of the first asset
    pub fn url(&self) -> Option<&str> {
        self.items
            .first()
            .and_then(|item| item.assets.first())
            .map(|asset| asset.url.as_str())
    }
}
