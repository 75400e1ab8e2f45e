//! Process-local cache driver.

use std::collections::HashMap;

use serde_json::Value;
use tracing::trace;

use super::{check_address, unix_now, CacheDriver, CacheEnvelope};
use crate::core::errors::Result;

/// In-memory driver; entries live as long as the driver.
#[derive(Debug, Default)]
pub struct MemoryCacheDriver {
    entries: HashMap<String, HashMap<String, CacheEnvelope>>,
    ttl_seconds: Option<u64>,
}

impl MemoryCacheDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl_seconds: Option<u64>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_seconds,
        }
    }

    /// Number of entries stored in a category, expired ones included
    pub fn len(&self, category: &str) -> usize {
        self.entries.get(category).map_or(0, HashMap::len)
    }

    /// Replace the payload of an entry in place, keeping its envelope.
    /// Used to simulate corrupted storage.
    pub fn overwrite_raw(&mut self, category: &str, key: &str, data: Value) -> bool {
        match self
            .entries
            .get_mut(category)
            .and_then(|entries| entries.get_mut(key))
        {
            Some(envelope) => {
                envelope.data = data;
                true
            }
            None => false,
        }
    }
}

impl CacheDriver for MemoryCacheDriver {
    fn store(&mut self, category: &str, key: &str, data: &Value, hash: Option<&str>) -> Result<()> {
        check_address(category, key)?;
        trace!("memory cache store {}/{}", category, key);
        self.entries
            .entry(category.to_string())
            .or_default()
            .insert(
                key.to_string(),
                CacheEnvelope::new(key, data, hash, self.ttl_seconds),
            );
        Ok(())
    }

    fn restore(&self, category: &str, key: &str, hash: Option<&str>) -> Option<Value> {
        let envelope = self.entries.get(category)?.get(key)?;
        if envelope.is_valid_for(key, hash, unix_now()) {
            Some(envelope.data.clone())
        } else {
            trace!("memory cache entry {}/{} rejected", category, key);
            None
        }
    }

    fn remove(&mut self, category: &str, key_prefix: &str) -> Result<()> {
        if let Some(entries) = self.entries.get_mut(category) {
            entries.retain(|key, _| !key.starts_with(key_prefix));
        }
        Ok(())
    }
}
