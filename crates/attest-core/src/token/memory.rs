//! In-memory token store
//!
//! Tokens are random opaque values kept in a bounded cache. Entries live for a
//! fixed time-to-live measured from issuance; lookups never extend it.

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::time::Duration;
use tracing::debug;

use super::TokenStore;
use crate::error::TokenError;
use crate::random::{random_id, TOKEN_SIZE};

/// Stateful token store backed by a capacity- and TTL-bound cache
pub struct MemoryTokenStore {
    /// token -> identifier
    tokens: Cache<String, String>,
    /// Remove tokens on first successful authentication
    single_use: bool,
}

impl MemoryTokenStore {
    /// Create a new store holding at most `capacity` tokens, each valid for `ttl`
    ///
    /// When capacity is exceeded, the least-recently-used token is evicted.
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let tokens = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .time_to_live(ttl)
            .build();

        Self {
            tokens,
            single_use: false,
        }
    }

    /// Consume tokens on their first successful authentication
    pub fn with_single_use(mut self, single_use: bool) -> Self {
        self.single_use = single_use;
        self
    }

    /// Number of live tokens (approximate until pending housekeeping runs)
    pub fn len(&self) -> u64 {
        self.tokens.entry_count()
    }

    /// Whether the store holds no tokens
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn issue(&self, identifier: &str) -> Result<String, TokenError> {
        let token = random_id(TOKEN_SIZE).map_err(|e| TokenError::Random(e.to_string()))?;
        self.tokens.insert(token.clone(), identifier.to_string()).await;
        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> Result<String, TokenError> {
        let identifier = if self.single_use {
            self.tokens.remove(token).await
        } else {
            self.tokens.get(token).await
        };

        identifier.ok_or_else(|| {
            debug!("Token not found in memory store");
            TokenError::InvalidToken("token not found".into())
        })
    }

    fn description(&self) -> &str {
        "in-memory token store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_then_authenticate() {
        let store = MemoryTokenStore::new(10, Duration::from_secs(60));
        let token = store.issue("C02ABC123").await.unwrap();

        assert_eq!(token.len(), 43);
        assert_eq!(store.authenticate(&token).await.unwrap(), "C02ABC123");
        // Reusable unless single-use
        assert_eq!(store.authenticate(&token).await.unwrap(), "C02ABC123");
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let store = MemoryTokenStore::new(10, Duration::from_secs(60));
        let err = store.authenticate("nope").await.unwrap_err();
        assert!(err.is_invalid_token());
    }

    #[tokio::test]
    async fn test_single_use() {
        let store = MemoryTokenStore::new(10, Duration::from_secs(60)).with_single_use(true);
        let token = store.issue("C02ABC123").await.unwrap();

        assert_eq!(store.authenticate(&token).await.unwrap(), "C02ABC123");
        assert!(store.authenticate(&token).await.unwrap_err().is_invalid_token());
    }

    #[tokio::test]
    async fn test_token_expires_even_when_read() {
        let store = MemoryTokenStore::new(10, Duration::from_millis(300));
        let token = store.issue("C02ABC123").await.unwrap();

        for _ in 0..4 {
            assert!(store.authenticate(&token).await.is_ok());
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(store.authenticate(&token).await.unwrap_err().is_invalid_token());
    }

    #[tokio::test]
    async fn test_lru_eviction_at_capacity() {
        let store = MemoryTokenStore::new(3, Duration::from_secs(60));
        assert!(store.is_empty());

        let a = store.issue("A").await.unwrap();
        let b = store.issue("B").await.unwrap();
        let c = store.issue("C").await.unwrap();
        store.tokens.run_pending_tasks().await;

        // Touch `a` so `b` becomes least recently used
        store.authenticate(&a).await.unwrap();
        store.tokens.run_pending_tasks().await;

        let d = store.issue("D").await.unwrap();
        store.tokens.run_pending_tasks().await;

        assert_eq!(store.len(), 3);
        assert!(store.authenticate(&b).await.unwrap_err().is_invalid_token());
        for (token, identifier) in [(&a, "A"), (&c, "C"), (&d, "D")] {
            assert_eq!(store.authenticate(token).await.unwrap(), identifier);
        }
    }

    #[tokio::test]
    async fn test_tokens_are_distinct() {
        let store = MemoryTokenStore::new(10, Duration::from_secs(60));
        let a = store.issue("A").await.unwrap();
        let b = store.issue("B").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.authenticate(&a).await.unwrap(), "A");
        assert_eq!(store.authenticate(&b).await.unwrap(), "B");
    }
}
