//! MDM backend abstraction

use async_trait::async_trait;

use crate::error::Result;
use crate::manifest::Manifest;

/// An MDM server able to run `InstallEnterpriseApplication`
#[async_trait]
pub trait Mdm: Send + Sync {
    /// Queue an `InstallEnterpriseApplication` command for the device `udid`
    async fn install_enterprise_application(&self, udid: &str, manifest: &Manifest) -> Result<()>;

    /// Resolve a serial number to the device's UDID
    ///
    /// Returns [`crate::MdmError::DeviceNotFound`] if no enrolled device has
    /// this serial.
    async fn serial_to_udid(&self, serial: &str) -> Result<String>;

    /// Short description of this MDM (for logging)
    fn description(&self) -> &str {
        "mdm"
    }
}
