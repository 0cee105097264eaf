//! Cache abstraction for parsed graphs and translation blobs.
//!
//! Entries are JSON values addressed by `(domain, name)`, where the domain
//! groups one kind of blob (`"spec_graphs"`, `"std_lib"`). Implementations
//! decide durability: [`MemoryCache`] here for tests and short-lived tools,
//! the redb-backed store in `capbridge-storage` for production.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised by a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Keyed JSON blob store.
#[async_trait]
pub trait SpecCache: Send + Sync {
    /// Load a blob, `None` when absent.
    async fn get(&self, domain: &str, name: &str) -> Result<Option<serde_json::Value>, CacheError>;

    /// Store a blob, returning whether an existing entry was replaced.
    async fn put(
        &self,
        domain: &str,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<bool, CacheError>;
}

/// In-memory cache keyed on `"domain:name"`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(domain: &str, name: &str) -> String {
        format!("{}:{}", domain, name)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl SpecCache for MemoryCache {
    async fn get(&self, domain: &str, name: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&Self::make_key(domain, name)).cloned())
    }

    async fn put(
        &self,
        domain: &str,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .insert(Self::make_key(domain, name), value.clone())
            .is_some())
    }
}
