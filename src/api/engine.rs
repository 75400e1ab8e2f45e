//! Top-level metrics run.

use indexmap::IndexSet;
use tracing::{info, warn};

use crate::analyzers::AnalyzerLoader;
use crate::api::report::ReportGenerator;
use crate::core::artifact::{ArtifactGraph, FingerprintIndex};
use crate::core::config::MetricsConfig;
use crate::core::errors::{MetricsError, Result};
use crate::core::listener::{AnalysisContext, AnalyzerListener};
use crate::io::cache::{driver_from_config, SharedCacheDriver};

/// Outcome of one [`MetricsEngine::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Analyzers executed, in execution order
    pub analyzers: Vec<&'static str>,
    pub artifacts: usize,
    /// Artifacts whose metrics could come from the cache
    pub cached_artifacts: usize,
}

/// Main metrics engine
#[derive(Debug)]
pub struct MetricsEngine {
    config: MetricsConfig,
    cache: SharedCacheDriver,
    context: AnalysisContext,
}

impl MetricsEngine {
    /// Validate `config` and open its cache driver
    pub fn new(config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        let cache = driver_from_config(&config.cache)?;
        info!("Metrics engine initialized ({:?} cache)", config.cache.driver);
        Ok(Self {
            config,
            cache,
            context: AnalysisContext::with_tracing(),
        })
    }

    /// Use an explicit cache driver instead of the configured one
    pub fn with_cache(config: MetricsConfig, cache: SharedCacheDriver) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache,
            context: AnalysisContext::with_tracing(),
        })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn cache(&self) -> SharedCacheDriver {
        self.cache.clone()
    }

    /// Observe every analyzer and visit event of subsequent runs
    pub fn add_listener(&mut self, listener: Box<dyn AnalyzerListener>) {
        self.context.add_listener(listener);
    }

    /// Analyze `graph` for `generators`.
    ///
    /// Configuration problems surface before any analyzer runs, so no
    /// generator ever sees partial data.
    pub fn run(
        &mut self,
        graph: &mut ArtifactGraph,
        generators: &mut [Box<dyn ReportGenerator>],
    ) -> Result<RunSummary> {
        if generators.is_empty() {
            return Err(MetricsError::config_field(
                "No report generator configured",
                "generators",
            ));
        }

        let requested: IndexSet<&'static str> = generators
            .iter()
            .flat_map(|generator| generator.accepted_analyzers())
            .collect();
        let mut loader = AnalyzerLoader::new(self.config.clone(), Some(self.cache.clone()));
        loader.load_all(requested.iter().copied())?;

        let previous = FingerprintIndex::load(&*self.cache.borrow());
        let cached_artifacts = previous.apply(graph)?;
        let graph: &ArtifactGraph = graph;
        info!(
            "Analyzing {} artifacts ({} unchanged) with {} analyzers",
            graph.len(),
            cached_artifacts,
            loader.loaded().len()
        );

        for analyzer in loader.loaded() {
            analyzer.borrow_mut().analyze(graph, &mut self.context)?;
        }

        if let Err(err) = FingerprintIndex::capture(graph).store(&mut *self.cache.borrow_mut()) {
            warn!("failed to store fingerprint index: {}", err);
        }

        for generator in generators.iter_mut() {
            for id in generator.accepted_analyzers() {
                let analyzer = loader.load(id)?;
                let analyzer = analyzer.borrow();
                generator.log_analyzer(&*analyzer);
            }
            generator.close()?;
        }

        Ok(RunSummary {
            analyzers: loader.loaded_ids(),
            artifacts: graph.len(),
            cached_artifacts,
        })
    }
}
