//! MDM Push Transport
//!
//! Delivers attestation tokens to macOS devices through an MDM server. The
//! token is embedded in the postinstall script of a signed installer package;
//! the package is staged in a file store and the MDM is told to run
//! `InstallEnterpriseApplication` against a manifest that points at it.
//!
//! ## Architecture
//!
//! - **`Mdm`**: the MDM backend (serial lookup, install command)
//! - **`MicroMdm`**: `Mdm` implementation for the MicroMDM HTTP API
//! - **`PackageBuilder`**: builds signed payload packages from `(token, path)`
//! - **`MdmTransport`**: the `attest_core::Transport` that ties them together
//!
//! ## Usage
//!
//! ```ignore
//! use attest_mdm::{MdmTransport, MicroMdm, ProductSignBuilder};
//!
//! let mdm = MicroMdm::new("https://mdm.example.com", api_token, 1000)?;
//! let transport = MdmTransport::new(
//!     Arc::new(mdm),
//!     files,
//!     Arc::new(ProductSignBuilder::new().with_signing_identity("Developer ID Installer: Example")),
//!     "https://attest.example.com/v1/attest/files",
//! );
//! ```

pub mod error;
pub mod manifest;
pub mod mdm;
pub mod micromdm;
pub mod package;
pub mod transport;

pub use error::{MdmError, Result};
pub use manifest::Manifest;
pub use mdm::Mdm;
pub use micromdm::MicroMdm;
pub use package::{postinstall_script, PackageBuilder, ProductSignBuilder};
pub use transport::{MdmTransport, PAYLOAD_NAME};
