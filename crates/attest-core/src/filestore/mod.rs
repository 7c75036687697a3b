//! Ephemeral file staging
//!
//! Transports use a file store to hold payloads (installer packages) that the
//! device fetches over HTTP. Every file lives under a random 128-bit id so
//! paths cannot be guessed, and every file expires on a fixed schedule.

pub mod memory;

pub use memory::MemoryFileStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FileStoreError;

/// Temporary storage for files needed by transports
///
/// Paths have the form `<random-id>/<name>`.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` under a fresh random id with the given logical `name`
    ///
    /// Returns the path `<random-id>/<name>`.
    async fn put(&self, name: &str, data: Bytes) -> Result<String, FileStoreError>;

    /// Return the file at `path` without removing it or extending its lifetime
    async fn peek(&self, path: &str) -> Result<Bytes, FileStoreError>;

    /// Return the file at `path` and remove it
    ///
    /// Of several concurrent callers, exactly one receives the file; the rest
    /// get [`FileStoreError::NotFound`].
    async fn get(&self, path: &str) -> Result<Bytes, FileStoreError>;
}

/// Reject logical names that would break the `<id>/<name>` layout
pub(crate) fn validate_name(name: &str) -> Result<(), FileStoreError> {
    if name.is_empty() || name.contains('/') {
        return Err(FileStoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
