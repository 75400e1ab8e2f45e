//! Token-stream fingerprints and the persisted `{key: fingerprint}` index used
//! to decide which artifacts are unchanged since the previous run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{Artifact, ArtifactGraph, Token};
use crate::io::cache::CacheDriver;
use crate::core::errors::Result;

/// Cache category holding fingerprint indexes
pub const FINGERPRINT_CATEGORY: &str = "fingerprints";

/// Cache key of the project-wide index
pub const FINGERPRINT_KEY: &str = "artifacts";

/// Hash a token stream; kind, image and line span all contribute
pub fn fingerprint_tokens(tokens: &[Token]) -> String {
    let mut hasher = Sha256::new();
    for token in tokens {
        hasher.update(token.kind.tag().as_bytes());
        hasher.update([0u8]);
        hasher.update(token.image.as_bytes());
        hasher.update([0u8]);
        hasher.update(token.start_line.to_be_bytes());
        hasher.update(token.end_line.to_be_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Fingerprints of every artifact in a graph, keyed by artifact key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintIndex {
    entries: IndexMap<String, String>,
}

impl FingerprintIndex {
    /// Snapshot the fingerprints of `graph`
    pub fn capture(graph: &ArtifactGraph) -> Self {
        let entries = graph
            .iter()
            .map(|artifact| {
                let meta = artifact.meta();
                (meta.key.clone(), meta.fingerprint.clone())
            })
            .collect();
        Self { entries }
    }

    /// Load the index written by the previous run; an unreadable entry is
    /// treated as an empty index
    pub fn load(driver: &dyn CacheDriver) -> Self {
        let Some(value) = driver.restore(FINGERPRINT_CATEGORY, FINGERPRINT_KEY, None) else {
            debug!("no previous fingerprint index");
            return Self::default();
        };
        match serde_json::from_value(value) {
            Ok(index) => index,
            Err(err) => {
                warn!("discarding unreadable fingerprint index: {}", err);
                Self::default()
            }
        }
    }

    pub fn store(&self, driver: &mut dyn CacheDriver) -> Result<()> {
        let value = serde_json::to_value(self)?;
        driver.store(FINGERPRINT_CATEGORY, FINGERPRINT_KEY, &value, None)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flag every artifact whose fingerprint matches this index as cached.
    /// Flags already set by the parser are kept. Returns the number of
    /// cached artifacts in the graph afterwards.
    pub fn apply(&self, graph: &mut ArtifactGraph) -> Result<usize> {
        let unchanged: Vec<_> = graph
            .iter()
            .map(Artifact::meta)
            .filter(|meta| self.get(&meta.key) == Some(meta.fingerprint.as_str()))
            .map(|meta| meta.id)
            .collect();

        for id in unchanged {
            graph.set_cached(id, true)?;
        }
        let cached = graph
            .iter()
            .filter(|artifact| artifact.meta().is_cached())
            .count();
        debug!("{} of {} artifacts unchanged", cached, graph.len());
        Ok(cached)
    }
}
