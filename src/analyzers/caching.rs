//! Restore/persist support for analyzers whose per-artifact metrics can be
//! reused when the artifact is unchanged.

use tracing::{debug, warn};

use crate::core::artifact::ArtifactMeta;
use crate::core::metrics::MetricsTable;
use crate::io::cache::{CacheScope, SharedCacheDriver};

/// Cache category for analyzer metrics
pub const METRICS_CATEGORY: &str = "metrics";

/// Cache state composed into every cache-aware analyzer.
///
/// Usage inside `analyze()`:
/// 1. [`MetricsCache::load`] before traversal
/// 2. [`MetricsCache::restore`] at the top of each visit; skip computation on a hit
/// 3. [`MetricsCache::unload`] after traversal
#[derive(Debug, Default)]
pub struct MetricsCache {
    driver: Option<SharedCacheDriver>,
    restored: MetricsTable,
}

impl MetricsCache {
    pub fn set_driver(&mut self, driver: SharedCacheDriver) {
        self.driver = Some(driver);
    }

    pub fn driver(&self) -> Option<SharedCacheDriver> {
        self.driver.clone()
    }

    /// Number of entries available for restoring
    pub fn restorable(&self) -> usize {
        self.restored.len()
    }

    /// Read the previous run's table stored under `analyzer`
    pub fn load(&mut self, analyzer: &str) {
        self.restored.clear();
        let Some(driver) = &self.driver else {
            return;
        };
        let Some(value) = driver.borrow().restore(METRICS_CATEGORY, analyzer, None) else {
            debug!("no cached metrics for {}", analyzer);
            return;
        };
        match serde_json::from_value::<MetricsTable>(value) {
            Ok(table) => {
                debug!("loaded {} cached entries for {}", table.len(), analyzer);
                self.restored = table;
            }
            Err(err) => warn!("ignoring corrupt metrics cache for {}: {}", analyzer, err),
        }
    }

    /// Copy the cached entry of an unchanged artifact into `table`.
    /// Returns false when the artifact changed or nothing was cached for it.
    pub fn restore(&self, artifact: &ArtifactMeta, table: &mut MetricsTable) -> bool {
        if !artifact.is_cached() {
            return false;
        }
        match self.restored.get(&artifact.key) {
            Some(metrics) => {
                table.insert(artifact.key.clone(), metrics.clone());
                true
            }
            None => false,
        }
    }

    /// Persist `table` under `analyzer` and drop the restore buffer.
    /// Write failures are logged; the computed metrics stay valid.
    pub fn unload(&mut self, analyzer: &str, table: &MetricsTable) {
        self.restored.clear();
        let Some(driver) = &self.driver else {
            return;
        };
        let mut driver = driver.borrow_mut();
        let mut scope = CacheScope::new(&mut *driver, METRICS_CATEGORY);
        let result = serde_json::to_value(table)
            .map_err(Into::into)
            .and_then(|value| scope.store(analyzer, &value, None));
        if let Err(err) = result {
            warn!("failed to persist metrics for {}: {}", analyzer, err);
        }
    }
}
