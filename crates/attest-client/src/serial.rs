//! Local serial number lookup

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ClientError;

/// Source of this machine's hardware serial number
#[async_trait]
pub trait SerialSource: Send + Sync {
    async fn serial(&self) -> Result<String, ClientError>;
}

/// Reads `IOPlatformSerialNumber` from the macOS I/O Registry
#[derive(Debug, Clone, Default)]
pub struct IoregSerial;

#[async_trait]
impl SerialSource for IoregSerial {
    async fn serial(&self) -> Result<String, ClientError> {
        let output = Command::new("ioreg")
            .args(["-c", "IOPlatformExpertDevice", "-d", "2"])
            .output()
            .await
            .map_err(|e| ClientError::Serial(format!("could not run ioreg: {}", e)))?;

        if !output.status.success() {
            return Err(ClientError::Serial(format!("ioreg exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ioreg(&stdout).ok_or_else(|| ClientError::Serial("IOPlatformSerialNumber not found".into()))
    }
}

/// A serial number known ahead of time
#[derive(Debug, Clone)]
pub struct FixedSerial(pub String);

#[async_trait]
impl SerialSource for FixedSerial {
    async fn serial(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}

/// Find the value of `"IOPlatformSerialNumber" = "<serial>"` in ioreg output
fn parse_ioreg(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        if key.trim().trim_start_matches('|').trim() != "\"IOPlatformSerialNumber\"" {
            return None;
        }
        Some(value.trim().trim_matches('"').to_string())
    })
}
