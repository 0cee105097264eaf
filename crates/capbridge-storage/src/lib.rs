//! Redb-backed spec cache.
//!
//! Persists parsed spec graphs and standard-library dictionaries in a single
//! [redb](https://docs.rs/redb) file, so devices keep resolving after a
//! restart or during an upstream outage. Implements the
//! [`SpecCache`](capbridge_core::cache::SpecCache) trait from
//! `capbridge-core`; the parser never knows whether it is talking to this
//! backend or the in-memory one.
//!
//! # Example
//!
//! ```no_run
//! use capbridge_core::cache::SpecCache;
//! use capbridge_storage::RedbCache;
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), capbridge_core::cache::CacheError> {
//! let cache = RedbCache::open("./data/capbridge.redb")?;
//! cache.put("spec_graphs", "en_acme", &json!({"services": []})).await?;
//! assert!(cache.get("spec_graphs", "en_acme").await?.is_some());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use capbridge_core::cache::{CacheError, SpecCache};
use redb::{Database, TableDefinition};

// Single unified table for all domains - using namespaced keys
// Format: "domain:name"
const UNIFIED_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("spec_cache");

/// Configuration for [`RedbCache`].
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct RedbCacheConfig {
    /// Path to the database file.
    pub path: String,

    /// Create parent directories if they don't exist.
    #[serde(default = "default_create_dirs")]
    pub create_dirs: bool,
}

fn default_create_dirs() -> bool {
    true
}

impl RedbCacheConfig {
    /// Create a new config with the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            create_dirs: true,
        }
    }

    /// Set whether to create parent directories.
    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    /// Create a config for an in-memory (temp-file backed) database.
    pub fn memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            create_dirs: false,
        }
    }
}

/// Create a namespaced key for the unified table.
fn make_key(domain: &str, name: &str) -> String {
    let mut key = String::with_capacity(domain.len() + name.len() + 1);
    key.push_str(domain);
    key.push(':');
    key.push_str(name);
    key
}

/// redb-based persistent spec cache.
pub struct RedbCache {
    /// redb database instance.
    db: Arc<Database>,
    /// Storage path (":memory:" for in-memory).
    path: String,
    /// Actual file path for temporary databases (for cleanup).
    temp_path: Option<PathBuf>,
}

impl RedbCache {
    /// Create a new RedbCache with the given configuration.
    pub fn new(config: RedbCacheConfig) -> Result<Self, CacheError> {
        let path = &config.path;

        let (db, temp_path) = if path == ":memory:" {
            // redb doesn't support true in-memory databases.
            // Use a temporary file instead.
            let temp_path =
                std::env::temp_dir().join(format!("capbridge_{}.redb", uuid::Uuid::new_v4()));
            let db =
                Database::create(&temp_path).map_err(|e| CacheError::Backend(e.to_string()))?;
            (db, Some(temp_path))
        } else {
            let path_ref = Path::new(path);
            if config.create_dirs {
                if let Some(parent) = path_ref.parent() {
                    std::fs::create_dir_all(parent).map_err(CacheError::Io)?;
                }
            }
            let db = if path_ref.exists() {
                Database::open(path_ref).map_err(|e| CacheError::Backend(e.to_string()))?
            } else {
                Database::create(path_ref).map_err(|e| CacheError::Backend(e.to_string()))?
            };
            (db, None)
        };

        Ok(Self {
            db: Arc::new(db),
            path: config.path,
            temp_path,
        })
    }

    /// Open or create a cache at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Self::new(RedbCacheConfig::new(
            path.as_ref().to_string_lossy().to_string(),
        ))
    }

    /// Create a throwaway cache backed by a temp file, removed on drop.
    pub fn memory() -> Result<Self, CacheError> {
        Self::new(RedbCacheConfig::memory())
    }

    /// Get the storage path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether entries outlive this handle.
    pub fn is_persistent(&self) -> bool {
        self.path != ":memory:"
    }
}

#[async_trait]
impl SpecCache for RedbCache {
    async fn get(&self, domain: &str, name: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let namespaced = make_key(domain, name);

        let txn = self
            .db
            .begin_read()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let table = match txn.open_table(UNIFIED_TABLE) {
            Ok(table) => table,
            // Nothing was ever written: the table does not exist yet.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(CacheError::Backend(e.to_string())),
        };

        match table
            .get(&*namespaced)
            .map_err(|e| CacheError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        domain: &str,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<bool, CacheError> {
        let namespaced = make_key(domain, name);
        let bytes = serde_json::to_vec(value)?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let replaced = {
            let mut table = txn
                .open_table(UNIFIED_TABLE)
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            // The insert guard borrows the table; release it before the
            // table drops at block end.
            let previous = table
                .insert(&*namespaced, &*bytes)
                .map_err(|e| CacheError::Backend(e.to_string()))?
                .is_some();
            previous
        };
        txn.commit()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(replaced)
    }
}

/// Cleanup temporary database file when RedbCache is dropped.
impl Drop for RedbCache {
    fn drop(&mut self) {
        if let Some(temp_path) = &self.temp_path {
            if let Err(e) = std::fs::remove_file(temp_path) {
                tracing::debug!(
                    "failed to remove temporary cache file {}: {}",
                    temp_path.display(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = RedbCacheConfig::new("./data/cache.redb").with_create_dirs(false);

        assert_eq!(config.path, "./data/cache.redb");
        assert!(!config.create_dirs);
    }

    #[test]
    fn test_config_memory() {
        let config = RedbCacheConfig::memory();
        assert_eq!(config.path, ":memory:");
    }

    #[test]
    fn test_make_key() {
        assert_eq!(make_key("spec_graphs", "en_acme"), "spec_graphs:en_acme");
    }

    #[test]
    fn test_memory_temp_file_removed_on_drop() {
        let cache = RedbCache::memory().unwrap();
        assert!(!cache.is_persistent());

        let temp = cache.temp_path.clone().unwrap();
        assert!(temp.exists());
        drop(cache);
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_corrupt_blob_surfaces_as_read_error() {
        let cache = RedbCache::memory().unwrap();

        // Plant garbage bytes under a cache key, bypassing the JSON layer.
        let txn = cache.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(UNIFIED_TABLE).unwrap();
            table
                .insert("spec_graphs:en_broken", b"not json".as_slice())
                .unwrap();
        }
        txn.commit().unwrap();

        let err = cache.get("spec_graphs", "en_broken").await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
