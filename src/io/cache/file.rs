//! File-backed cache driver: one JSON document per entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::{check_address, unix_now, CacheDriver, CacheEnvelope};
use crate::core::errors::{MetricsError, Result};

/// Stores entries below `root/<category>/<sha256(key)>.json`.
#[derive(Debug, Clone)]
pub struct FileCacheDriver {
    root: PathBuf,
    ttl_seconds: Option<u64>,
}

impl FileCacheDriver {
    pub fn new(root: impl Into<PathBuf>, ttl_seconds: Option<u64>) -> Self {
        Self {
            root: root.into(),
            ttl_seconds,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn category_dir(&self, category: &str) -> PathBuf {
        let sanitized: String = category
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(sanitized)
    }

    /// Path of the file holding `category`/`key`
    pub fn entry_path(&self, category: &str, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.category_dir(category)
            .join(format!("{:x}.json", hasher.finalize()))
    }

    fn read_envelope(path: &Path) -> Option<CacheEnvelope> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(err) => {
                trace!("cache file {} unavailable: {}", path.display(), err);
                return None;
            }
        };
        match serde_json::from_slice(&content) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                debug!("ignoring corrupt cache file {}: {}", path.display(), err);
                None
            }
        }
    }
}

impl CacheDriver for FileCacheDriver {
    fn store(&mut self, category: &str, key: &str, data: &Value, hash: Option<&str>) -> Result<()> {
        check_address(category, key)?;
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir).map_err(|e| {
            MetricsError::io(
                format!("Failed to create cache directory: {}", dir.display()),
                e,
            )
        })?;

        let path = self.entry_path(category, key);
        let temp_path = path.with_extension("tmp");
        let envelope = CacheEnvelope::new(key, data, hash, self.ttl_seconds);
        let content = serde_json::to_vec(&envelope)?;

        fs::write(&temp_path, content).map_err(|e| {
            MetricsError::io(
                format!("Failed to write cache file: {}", temp_path.display()),
                e,
            )
        })?;

        // Atomic rename so readers never see a partial entry
        fs::rename(&temp_path, &path).map_err(|e| {
            MetricsError::io(
                format!("Failed to rename cache file: {}", path.display()),
                e,
            )
        })
    }

    fn restore(&self, category: &str, key: &str, hash: Option<&str>) -> Option<Value> {
        let envelope = Self::read_envelope(&self.entry_path(category, key))?;
        if envelope.is_valid_for(key, hash, unix_now()) {
            Some(envelope.data)
        } else {
            trace!("cache entry {}/{} rejected", category, key);
            None
        }
    }

    fn remove(&mut self, category: &str, key_prefix: &str) -> Result<()> {
        let dir = self.category_dir(category);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(MetricsError::io(
                    format!("Failed to list cache directory: {}", dir.display()),
                    err,
                ))
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(envelope) = Self::read_envelope(&path) else {
                continue;
            };
            if envelope.key.starts_with(key_prefix) {
                fs::remove_file(&path).map_err(|e| {
                    MetricsError::io(
                        format!("Failed to remove cache file: {}", path.display()),
                        e,
                    )
                })?;
            }
        }
        Ok(())
    }
}
