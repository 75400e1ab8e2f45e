//! Observation hooks fired around analyzer runs and artifact visits.
//!
//! Listeners never influence metric computation; they exist for progress
//! reporting and debugging.

use std::fmt;

use tracing::trace;

use crate::core::artifact::ArtifactMeta;

/// Receives start/end events from analyzers.
pub trait AnalyzerListener: fmt::Debug {
    fn start_analyzer(&mut self, _analyzer: &str) {}

    fn end_analyzer(&mut self, _analyzer: &str) {}

    fn start_visit(&mut self, _analyzer: &str, _artifact: &ArtifactMeta) {}

    fn end_visit(&mut self, _analyzer: &str, _artifact: &ArtifactMeta) {}
}

/// Reports every event at `trace` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl AnalyzerListener for TracingListener {
    fn start_analyzer(&mut self, analyzer: &str) {
        trace!(analyzer, "analyzer started");
    }

    fn end_analyzer(&mut self, analyzer: &str) {
        trace!(analyzer, "analyzer finished");
    }

    fn start_visit(&mut self, analyzer: &str, artifact: &ArtifactMeta) {
        trace!(analyzer, kind = %artifact.kind, "start {}", artifact.qualified_name);
    }

    fn end_visit(&mut self, analyzer: &str, artifact: &ArtifactMeta) {
        trace!(analyzer, kind = %artifact.kind, "end {}", artifact.qualified_name);
    }
}

/// Per-run context threaded through every analyzer.
#[derive(Debug, Default)]
pub struct AnalysisContext {
    listeners: Vec<Box<dyn AnalyzerListener>>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a [`TracingListener`] attached
    pub fn with_tracing() -> Self {
        let mut context = Self::new();
        context.add_listener(Box::new(TracingListener));
        context
    }

    pub fn add_listener(&mut self, listener: Box<dyn AnalyzerListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn fire_start_analyzer(&mut self, analyzer: &str) {
        for listener in &mut self.listeners {
            listener.start_analyzer(analyzer);
        }
    }

    pub fn fire_end_analyzer(&mut self, analyzer: &str) {
        for listener in &mut self.listeners {
            listener.end_analyzer(analyzer);
        }
    }

    pub fn fire_start_visit(&mut self, analyzer: &str, artifact: &ArtifactMeta) {
        for listener in &mut self.listeners {
            listener.start_visit(analyzer, artifact);
        }
    }

    pub fn fire_end_visit(&mut self, analyzer: &str, artifact: &ArtifactMeta) {
        for listener in &mut self.listeners {
            listener.end_visit(analyzer, artifact);
        }
    }
}
