//! Configuration types and management for archmetrics.
//!
//! Every tunable constant of the analysis core (CodeRank damping, iteration
//! cap, convergence threshold, cache location and lifetime) lives here so the
//! analyzers never hard-code them.

pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analyzers::coderank::StrategyKind;
use crate::core::errors::{MetricsError, Result};

pub use validation::{
    validate_non_empty, validate_open_unit_interval, validate_positive_f64,
    validate_positive_usize,
};

/// Main configuration for the metrics engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// CodeRank settings
    #[serde(default)]
    pub coderank: CodeRankConfig,

    /// Metrics cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Package dependency settings
    #[serde(default)]
    pub dependency: DependencyConfig,
}

/// Configuration construction and I/O methods for [`MetricsConfig`].
impl MetricsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MetricsError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            MetricsError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.coderank.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

/// CodeRank configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRankConfig {
    /// Names of the graph construction strategies to combine
    #[serde(default = "CodeRankConfig::default_strategies")]
    pub strategies: Vec<String>,

    /// PageRank damping factor
    #[serde(default = "CodeRankConfig::default_damping_factor")]
    pub damping_factor: f64,

    /// Iteration cap; reaching it is a soft stop
    #[serde(default = "CodeRankConfig::default_max_iterations")]
    pub max_iterations: usize,

    /// Maximum absolute per-node change that counts as converged
    #[serde(default = "CodeRankConfig::default_convergence_threshold")]
    pub convergence_threshold: f64,
}

impl Default for CodeRankConfig {
    fn default() -> Self {
        Self {
            strategies: Self::default_strategies(),
            damping_factor: Self::default_damping_factor(),
            max_iterations: Self::default_max_iterations(),
            convergence_threshold: Self::default_convergence_threshold(),
        }
    }
}

impl CodeRankConfig {
    fn default_strategies() -> Vec<String> {
        vec![StrategyKind::Inheritance.name().to_string()]
    }

    const fn default_damping_factor() -> f64 {
        0.85
    }

    const fn default_max_iterations() -> usize {
        100
    }

    const fn default_convergence_threshold() -> f64 {
        1e-6
    }

    /// Resolve the configured strategy names, failing on the first unknown one
    pub fn strategy_kinds(&self) -> Result<Vec<StrategyKind>> {
        let mut kinds = Vec::with_capacity(self.strategies.len());
        for name in &self.strategies {
            let kind = StrategyKind::from_name(name).ok_or_else(|| {
                MetricsError::config_field(
                    format!("Unknown CodeRank strategy '{}'", name),
                    "coderank.strategies",
                )
            })?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    /// Validate CodeRank configuration
    pub fn validate(&self) -> Result<()> {
        validate_non_empty(&self.strategies, "coderank.strategies")?;
        validate_open_unit_interval(self.damping_factor, "coderank.damping_factor")?;
        validate_positive_usize(self.max_iterations, "coderank.max_iterations")?;
        validate_positive_f64(self.convergence_threshold, "coderank.convergence_threshold")?;
        self.strategy_kinds()?;
        Ok(())
    }
}

/// Storage medium backing the metrics cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriverKind {
    /// Process-local map, discarded with the engine
    Memory,
    /// One JSON file per entry below [`CacheConfig::location`]
    File,
}

/// Metrics cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Which driver to construct
    #[serde(default = "CacheConfig::default_driver")]
    pub driver: CacheDriverKind,

    /// Cache directory for the file driver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,

    /// Entry lifetime; `None` keeps entries until overwritten
    #[serde(default = "CacheConfig::default_ttl_seconds")]
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: Self::default_driver(),
            location: None,
            ttl_seconds: Self::default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    const fn default_driver() -> CacheDriverKind {
        CacheDriverKind::Memory
    }

    const fn default_ttl_seconds() -> Option<u64> {
        Some(30 * 24 * 60 * 60)
    }

    /// Directory used by the file driver
    pub fn resolved_location(&self) -> Result<PathBuf> {
        if let Some(location) = &self.location {
            return Ok(location.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join("archmetrics"))
            .ok_or_else(|| {
                MetricsError::config_field(
                    "No platform cache directory available; set cache.location",
                    "cache.location",
                )
            })
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<()> {
        if self.ttl_seconds == Some(0) {
            return Err(MetricsError::validation_field(
                "cache.ttl_seconds must be greater than 0 when set",
                "cache.ttl_seconds",
            ));
        }
        Ok(())
    }
}

/// Package dependency analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Run package cycle detection
    #[serde(default = "DependencyConfig::default_detect_cycles")]
    pub detect_cycles: bool,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            detect_cycles: Self::default_detect_cycles(),
        }
    }
}

impl DependencyConfig {
    const fn default_detect_cycles() -> bool {
        true
    }
}

#[cfg(test)]
mod tests;
