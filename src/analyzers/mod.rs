//! Metric analyzers and the machinery that wires them together.
//!
//! Each analyzer walks the read-only [`ArtifactGraph`] once per instance and
//! keeps its results in its own tables; report generators pull them through
//! the [`NodeAware`] and [`ProjectAware`] capabilities.

pub mod caching;
pub mod class_level;
pub mod coderank;
pub mod coupling;
pub mod cyclomatic;
pub mod dependency;
pub mod inheritance;
pub mod loader;
pub mod loc;
pub mod node_count;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::artifact::{ArtifactGraph, ArtifactMeta};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::NodeMetrics;
use crate::io::cache::SharedCacheDriver;

pub use caching::MetricsCache;
pub use loader::{AnalyzerLoader, AnalyzerRegistration};

/// Lifecycle of one analyzer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisState {
    #[default]
    Uninitialized,
    Analyzing,
    Analyzed,
}

impl AnalysisState {
    /// Move to `Analyzing`; false when the instance already ran or is running
    pub fn begin(&mut self) -> bool {
        if *self != Self::Uninitialized {
            return false;
        }
        *self = Self::Analyzing;
        true
    }

    pub fn finish(&mut self) {
        *self = Self::Analyzed;
    }
}

/// A metric analyzer.
pub trait Analyzer: fmt::Debug {
    /// Stable identifier used by the loader, report generators and the cache
    fn id(&self) -> &'static str;

    /// Compute metrics for `graph`; calls after the first are no-ops
    fn analyze(&mut self, graph: &ArtifactGraph, context: &mut AnalysisContext) -> Result<()>;

    fn state(&self) -> AnalysisState;

    fn as_node_aware(&self) -> Option<&dyn NodeAware> {
        None
    }

    fn as_project_aware(&self) -> Option<&dyn ProjectAware> {
        None
    }

    fn as_cache_aware(&mut self) -> Option<&mut dyn CacheAware> {
        None
    }
}

/// Exposes per-artifact metrics
pub trait NodeAware {
    /// Metrics for `artifact`; empty when none were computed
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics;
}

/// Exposes project-wide metrics
pub trait ProjectAware {
    fn project_metrics(&self) -> NodeMetrics;
}

/// Accepts the run's shared cache driver
pub trait CacheAware {
    fn set_cache(&mut self, driver: SharedCacheDriver);

    fn cache(&self) -> Option<SharedCacheDriver>;
}

/// Analyzer instance shared between the loader, aggregates and generators
pub type SharedAnalyzer = Rc<RefCell<dyn Analyzer>>;

/// Wrap an analyzer for sharing
pub fn shared(analyzer: impl Analyzer + 'static) -> SharedAnalyzer {
    Rc::new(RefCell::new(analyzer))
}
