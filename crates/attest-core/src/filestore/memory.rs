//! In-memory file store
//!
//! Files are held in a bounded cache with least-recently-used eviction and a
//! time-to-live counted from insertion. Reads (peek or get) never renew an
//! entry's lifetime: a staged secret becomes unrecoverable on schedule no
//! matter how often it is polled.

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::time::Duration;
use tracing::debug;

use super::{validate_name, FileStore};
use crate::error::FileStoreError;
use crate::random::{random_id, PATH_ID_SIZE};

/// In-memory file store with capacity and TTL bounds
pub struct MemoryFileStore {
    files: Cache<String, Bytes>,
}

impl MemoryFileStore {
    /// Create a store holding at most `capacity` files, each for `ttl`
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let files = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .time_to_live(ttl)
            .build();

        Self { files }
    }

    /// Number of staged files (approximate until pending housekeeping runs)
    pub fn len(&self) -> u64 {
        self.files.entry_count()
    }

    /// Whether no files are staged
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<String, FileStoreError> {
        validate_name(name)?;

        let id = random_id(PATH_ID_SIZE).map_err(|e| FileStoreError::Random(e.to_string()))?;
        let path = format!("{}/{}", id, name);

        debug!(path = %path, size = data.len(), "Staging file");
        self.files.insert(path.clone(), data).await;

        Ok(path)
    }

    async fn peek(&self, path: &str) -> Result<Bytes, FileStoreError> {
        self.files.get(path).await.ok_or(FileStoreError::NotFound)
    }

    async fn get(&self, path: &str) -> Result<Bytes, FileStoreError> {
        let data = self.files.remove(path).await.ok_or(FileStoreError::NotFound)?;
        debug!(path = %path, "Consumed staged file");
        Ok(data)
    }
}
