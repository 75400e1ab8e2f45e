//! Key/value cache drivers used to persist per-artifact metrics across runs.
//!
//! Entries live in a category (`"metrics"`, `"fingerprints"`) and are wrapped
//! in a [`CacheEnvelope`] carrying the format version, an optional content hash
//! and an optional expiry. Anything that does not check out on restore is a
//! miss; drivers never hand back stale or foreign data.

pub mod file;
pub mod memory;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::config::{CacheConfig, CacheDriverKind};
use crate::core::errors::{MetricsError, Result};

pub use file::FileCacheDriver;
pub use memory::MemoryCacheDriver;

/// Bump when the envelope or any stored payload changes shape
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Marker stored with each entry; entries written by another format or
/// crate version never match and are treated as misses.
pub fn environment_marker() -> String {
    format!("{}-{}", CACHE_FORMAT_VERSION, env!("CARGO_PKG_VERSION"))
}

/// Typed key/value store with TTL and hash-verified entries.
pub trait CacheDriver: fmt::Debug {
    /// Store `data` under `category`/`key`, replacing any previous entry
    fn store(&mut self, category: &str, key: &str, data: &Value, hash: Option<&str>) -> Result<()>;

    /// Fetch an entry; `None` on miss, hash mismatch, version mismatch,
    /// expiry or unreadable data
    fn restore(&self, category: &str, key: &str, hash: Option<&str>) -> Option<Value>;

    /// Drop every entry in `category` whose key starts with `key_prefix`
    fn remove(&mut self, category: &str, key_prefix: &str) -> Result<()>;
}

/// Driver instance shared by every analyzer of one run
pub type SharedCacheDriver = Rc<RefCell<dyn CacheDriver>>;

/// Wrap a driver for sharing between analyzers
pub fn shared(driver: impl CacheDriver + 'static) -> SharedCacheDriver {
    Rc::new(RefCell::new(driver))
}

/// Build the driver selected by configuration
pub fn driver_from_config(config: &CacheConfig) -> Result<SharedCacheDriver> {
    Ok(match config.driver {
        CacheDriverKind::Memory => shared(MemoryCacheDriver::with_ttl(config.ttl_seconds)),
        CacheDriverKind::File => shared(FileCacheDriver::new(
            config.resolved_location()?,
            config.ttl_seconds,
        )),
    })
}

/// Binds a category to a driver for a sequence of calls.
pub struct CacheScope<'a> {
    driver: &'a mut dyn CacheDriver,
    category: &'a str,
}

impl<'a> CacheScope<'a> {
    pub fn new(driver: &'a mut dyn CacheDriver, category: &'a str) -> Self {
        Self { driver, category }
    }

    pub fn store(&mut self, key: &str, data: &Value, hash: Option<&str>) -> Result<()> {
        self.driver.store(self.category, key, data, hash)
    }

    pub fn restore(&self, key: &str, hash: Option<&str>) -> Option<Value> {
        self.driver.restore(self.category, key, hash)
    }

    pub fn remove(&mut self, key_prefix: &str) -> Result<()> {
        self.driver.remove(self.category, key_prefix)
    }
}

/// On-medium representation of a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// Environment marker at write time
    pub version: String,

    /// Full key, kept so prefix removal works on hashed file names
    pub key: String,

    /// Optional content hash the reader must present
    pub hash: Option<String>,

    /// Unix timestamp after which the entry is a miss
    pub expires_at: Option<u64>,

    pub data: Value,
}

impl CacheEnvelope {
    pub fn new(key: &str, data: &Value, hash: Option<&str>, ttl_seconds: Option<u64>) -> Self {
        Self {
            version: environment_marker(),
            key: key.to_string(),
            hash: hash.map(str::to_string),
            expires_at: ttl_seconds.map(|ttl| unix_now().saturating_add(ttl)),
            data: data.clone(),
        }
    }

    /// Whether the entry may be served for `key` and `hash` at time `now`
    pub fn is_valid_for(&self, key: &str, hash: Option<&str>, now: u64) -> bool {
        if self.version != environment_marker() || self.key != key {
            return false;
        }
        if let Some(expected) = hash {
            if self.hash.as_deref() != Some(expected) {
                return false;
            }
        }
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

/// Reject entries that could not be addressed again
pub(crate) fn check_address(category: &str, key: &str) -> Result<()> {
    if category.is_empty() {
        return Err(MetricsError::cache_key("Cache category must not be empty", key));
    }
    if key.is_empty() {
        return Err(MetricsError::cache_key(
            format!("Cache key in category '{}' must not be empty", category),
            key,
        ));
    }
    Ok(())
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_rejects_foreign_versions() {
        let mut envelope = CacheEnvelope::new("loc", &json!({}), None, None);
        assert!(envelope.is_valid_for("loc", None, unix_now()));

        envelope.version = "0-0.0.0".to_string();
        assert!(!envelope.is_valid_for("loc", None, unix_now()));
    }

    #[test]
    fn envelope_checks_hash_only_when_requested() {
        let envelope = CacheEnvelope::new("loc", &json!(1), Some("abc"), None);
        assert!(envelope.is_valid_for("loc", None, 0));
        assert!(envelope.is_valid_for("loc", Some("abc"), 0));
        assert!(!envelope.is_valid_for("loc", Some("def"), 0));
    }

    #[test]
    fn envelope_expires() {
        let envelope = CacheEnvelope::new("loc", &json!(1), None, Some(10));
        let written = envelope.expires_at.unwrap() - 10;
        assert!(envelope.is_valid_for("loc", None, written));
        assert!(!envelope.is_valid_for("loc", None, written + 10));
    }

    #[test]
    fn scope_binds_category() {
        let mut driver = MemoryCacheDriver::new();
        {
            let mut scope = CacheScope::new(&mut driver, "metrics");
            scope.store("loc", &json!({"a": 1}), None).unwrap();
            assert_eq!(scope.restore("loc", None), Some(json!({"a": 1})));
        }
        assert!(driver.restore("fingerprints", "loc", None).is_none());
    }

    #[test]
    fn config_selects_driver() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            driver: CacheDriverKind::File,
            location: Some(dir.path().to_path_buf()),
            ttl_seconds: None,
        };
        let driver = driver_from_config(&config).unwrap();
        driver
            .borrow_mut()
            .store("metrics", "loc", &json!([1, 2]), None)
            .unwrap();
        assert!(dir.path().join("metrics").exists());
    }
}
