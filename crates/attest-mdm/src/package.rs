//! Payload packages
//!
//! The payload is a flat installer package with no files and a single
//! postinstall script. macOS runs postinstall scripts as root, so the only way
//! the token reaches its path is through root-level execution on the device.

use async_trait::async_trait;
use bytes::Bytes;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MdmError, Result};

/// Default package identifier
pub const DEFAULT_PACKAGE_ID: &str = "com.github.attest.payload";

/// Default package version
pub const DEFAULT_PACKAGE_VERSION: &str = "1.0.0";

/// Builds signed installer packages that write `token` to `path`
#[async_trait]
pub trait PackageBuilder: Send + Sync {
    /// Build and sign a package embedding `token` and `path`
    async fn build(&self, token: &str, path: &str) -> Result<Bytes>;
}

/// Quote a string for POSIX sh using single quotes
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render the postinstall script that writes `token` to `path`
///
/// The token is first written inside a private directory created by
/// `mktemp -d`, made 0600 root:wheel, then renamed into place so readers never see a partial token. The script refuses
/// to run if anything, including a symlink, already sits at `path`.
pub fn postinstall_script(token: &str, path: &str) -> String {
    format!(
        r#"#!/bin/sh
set -eu
umask 077

token_path={path}

refuse_existing() {{
    if [ -e "$token_path" ] || [ -L "$token_path" ]; then
        echo "attest: $token_path already exists" >&2
        exit 1
    fi
}}

refuse_existing

tmp_dir=$(mktemp -d "${{token_path}}.XXXXXXXX")
trap 'rm -rf "$tmp_dir"' EXIT

printf '%s' {token} > "$tmp_dir/token"
chown root:wheel "$tmp_dir/token"
chmod 0600 "$tmp_dir/token"

refuse_existing
mv -f "$tmp_dir/token" "$token_path"

exit 0
"#,
        path = shell_quote(path),
        token = shell_quote(token),
    )
}

/// Builds packages with `pkgbuild` and signs them with `productsign`
///
/// Requires the macOS command line tools on the server. Without a signing
/// identity the package is left unsigned, which macOS refuses to install via
/// MDM; that mode is only useful for inspection.
#[derive(Debug, Clone)]
pub struct ProductSignBuilder {
    identifier: String,
    version: String,
    signing_identity: Option<String>,
    keychain: Option<String>,
}

impl ProductSignBuilder {
    /// Create a builder with the default identifier and version
    pub fn new() -> Self {
        Self {
            identifier: DEFAULT_PACKAGE_ID.to_string(),
            version: DEFAULT_PACKAGE_VERSION.to_string(),
            signing_identity: None,
            keychain: None,
        }
    }

    /// Set the package identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Set the "Developer ID Installer" identity passed to `productsign --sign`
    pub fn with_signing_identity(mut self, identity: impl Into<String>) -> Self {
        self.signing_identity = Some(identity.into());
        self
    }

    /// Set the keychain holding the signing identity
    pub fn with_keychain(mut self, keychain: impl Into<String>) -> Self {
        self.keychain = Some(keychain.into());
        self
    }

    fn pkgbuild_args(&self, scripts: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "--nopayload".into(),
            "--scripts".into(),
            scripts.as_os_str().to_owned(),
            "--identifier".into(),
            self.identifier.clone().into(),
            "--version".into(),
            self.version.clone().into(),
            output.as_os_str().to_owned(),
        ]
    }

    fn productsign_args(&self, identity: &str, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--sign".into(), identity.into()];
        if let Some(ref keychain) = self.keychain {
            args.push("--keychain".into());
            args.push(keychain.into());
        }
        args.push(input.as_os_str().to_owned());
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Default for ProductSignBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn run(program: &str, args: Vec<OsString>) -> Result<()> {
    let output = Command::new(program)
        .args(&args)
        .output()
        .await
        .map_err(|e| MdmError::Package(format!("could not run {}: {}", program, e)))?;

    if !output.status.success() {
        return Err(MdmError::Package(format!(
            "{} failed ({}): {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

#[async_trait]
impl PackageBuilder for ProductSignBuilder {
    async fn build(&self, token: &str, path: &str) -> Result<Bytes> {
        let workdir = tempfile::tempdir()?;
        let scripts = workdir.path().join("scripts");
        tokio::fs::create_dir(&scripts).await?;

        let script_path = scripts.join("postinstall");
        tokio::fs::write(&script_path, postinstall_script(token, path)).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o700)).await?;
        }

        let unsigned = workdir.path().join("unsigned.pkg");
        run("pkgbuild", self.pkgbuild_args(&scripts, &unsigned)).await?;

        let package = match self.signing_identity {
            Some(ref identity) => {
                let signed = workdir.path().join("signed.pkg");
                run("productsign", self.productsign_args(identity, &unsigned, &signed)).await?;
                signed
            }
            None => unsigned,
        };

        let bytes = tokio::fs::read(&package).await?;
        debug!(size = bytes.len(), signed = self.signing_identity.is_some(), "Built payload package");

        Ok(Bytes::from(bytes))
    }
}
