//! MicroMDM client
//!
//! Talks to the MicroMDM HTTP API with basic auth (user `micromdm`, API key as
//! password). Serial-to-UDID lookups are cached since a device's UDID does not
//! change while it stays enrolled.

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{MdmError, Result};
use crate::manifest::Manifest;
use crate::mdm::Mdm;

/// Basic auth user MicroMDM expects
const API_USER: &str = "micromdm";

/// Outbound request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct DeviceQuery<'a> {
    filter_serial: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct Device {
    #[serde(default)]
    udid: String,
}

#[derive(Debug, Serialize)]
struct InstallCommand<'a> {
    request_type: &'static str,
    udid: &'a str,
    manifest: &'a Manifest,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    error: String,
}

/// MicroMDM API client
pub struct MicroMdm {
    /// Server URL without the trailing slash, e.g. `https://mdm.example.com`
    url_prefix: String,
    api_token: String,
    http_client: reqwest::Client,
    /// serial -> UDID
    udids: Cache<String, String>,
}

impl MicroMdm {
    /// Create a new client; `cache_size` bounds the serial-to-UDID cache
    pub fn new(url_prefix: impl Into<String>, api_token: impl Into<String>, cache_size: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            http_client,
            udids: Cache::builder().max_capacity(cache_size).build(),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}{}", self.url_prefix, endpoint))
            .basic_auth(API_USER, Some(&self.api_token))
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl Mdm for MicroMdm {
    async fn serial_to_udid(&self, serial: &str) -> Result<String> {
        if let Some(udid) = self.udids.get(serial).await {
            debug!(serial = %serial, "Using cached UDID");
            return Ok(udid);
        }

        let response = self.post("/v1/devices", &DeviceQuery { filter_serial: [serial] }).await?;
        let status = response.status();
        let body: DevicesResponse = response
            .json()
            .await
            .map_err(|e| MdmError::Response(format!("{} (status {})", e, status)))?;

        if !body.error.is_empty() {
            return Err(MdmError::Command(format!("could not query devices: {}", body.error)));
        }
        if !status.is_success() {
            return Err(MdmError::Response(format!("unexpected status {}", status)));
        }

        let udid = match body.devices.as_slice() {
            [device] if !device.udid.is_empty() => device.udid.clone(),
            _ => return Err(MdmError::DeviceNotFound(serial.to_string())),
        };

        self.udids.insert(serial.to_string(), udid.clone()).await;
        debug!(serial = %serial, udid = %udid, "Resolved UDID");

        Ok(udid)
    }

    async fn install_enterprise_application(&self, udid: &str, manifest: &Manifest) -> Result<()> {
        let command = InstallCommand {
            request_type: "InstallEnterpriseApplication",
            udid,
            manifest,
        };

        let response = self.post("/v1/commands", &command).await?;
        let status = response.status();
        let body: CommandResponse = response
            .json()
            .await
            .map_err(|e| MdmError::Response(format!("{} (status {})", e, status)))?;

        if !body.error.is_empty() {
            return Err(MdmError::Command(format!("could not execute command: {}", body.error)));
        }
        if !status.is_success() {
            return Err(MdmError::Response(format!("unexpected status {}", status)));
        }

        debug!(udid = %udid, url = ?manifest.url(), "Queued InstallEnterpriseApplication");
        Ok(())
    }

    fn description(&self) -> &str {
        "MicroMDM"
    }
}
