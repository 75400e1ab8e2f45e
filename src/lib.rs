//! # archmetrics: structural software metrics engine
//!
//! Computes size, complexity, coupling, inheritance, CodeRank and package
//! cycle metrics over an already parsed code base. A parser fills an
//! [`ArtifactGraph`]; the [`MetricsEngine`] resolves the analyzers requested
//! by its report generators, runs each of them once over the graph and hands
//! the results to the generators.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        API Layer                            │
//! │            MetricsEngine · ReportGenerator                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core            │  Analyzers          │  I/O               │
//! │                  │                     │                    │
//! │ • Artifact graph │ • LOC · CCN         │ • Cache drivers    │
//! │ • Visitor        │ • Coupling · Counts │   (memory, file)   │
//! │ • Listeners      │ • Inheritance       │                    │
//! │ • Metrics tables │ • Dependency cycles │                    │
//! │ • Config         │ • CodeRank          │                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archmetrics::{
//!     Analyzer, ArtifactGraph, Declaration, MetricsConfig, MetricsEngine, ReportGenerator,
//! };
//!
//! #[derive(Default)]
//! struct Summary;
//!
//! impl ReportGenerator for Summary {
//!     fn accepted_analyzers(&self) -> Vec<&'static str> {
//!         vec!["loc", "dependency"]
//!     }
//!
//!     fn log_analyzer(&mut self, analyzer: &dyn Analyzer) {
//!         if let Some(project) = analyzer.as_project_aware() {
//!             println!("{}: {:?}", analyzer.id(), project.project_metrics());
//!         }
//!     }
//!
//!     fn close(&mut self) -> archmetrics::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> archmetrics::Result<()> {
//!     let mut graph = ArtifactGraph::new();
//!     let app = graph.namespace("app");
//!     graph.add_class(app, Declaration::new("Service"))?;
//!
//!     let mut engine = MetricsEngine::new(MetricsConfig::default())?;
//!     let mut generators: Vec<Box<dyn ReportGenerator>> = vec![Box::new(Summary)];
//!     let summary = engine.run(&mut graph, &mut generators)?;
//!     println!("ran {:?}", summary.analyzers);
//!     Ok(())
//! }
//! ```

#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Artifact model, traversal and shared infrastructure
pub mod core {
    //! Artifact graph, traversal and shared infrastructure.

    pub mod artifact;
    pub mod config;
    pub mod errors;
    pub mod listener;
    pub mod metrics;
    pub mod visitor;
}

// Metric analyzers, registry and loader
pub mod analyzers;

// Cache storage
pub mod io {
    //! Persistence of analyzer results between runs.

    pub mod cache;
}

// Public API and engine interface
pub mod api {
    //! High-level API and engine interface.

    pub mod engine;
    pub mod logging;
    pub mod report;
}

// Re-export primary types for convenience
pub use analyzers::{
    AnalysisState, Analyzer, AnalyzerLoader, CacheAware, NodeAware, ProjectAware, SharedAnalyzer,
};
pub use api::engine::{MetricsEngine, RunSummary};
pub use api::logging::init_tracing;
pub use api::report::ReportGenerator;
pub use core::artifact::{ArtifactGraph, Declaration, NodeId};
pub use core::config::MetricsConfig;
pub use core::errors::{MetricsError, Result, ResultExt};
pub use core::metrics::NodeMetrics;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
