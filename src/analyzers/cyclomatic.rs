//! Cyclomatic complexity (`ccn`) and extended cyclomatic complexity (`ccn2`)
//! of functions and methods, computed from the callable's body tokens.

use crate::analyzers::{AnalysisState, Analyzer, CacheAware, MetricsCache, NodeAware, ProjectAware};
use crate::core::artifact::{ArtifactGraph, ArtifactMeta, Callable, Token, TokenKind};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics, ProjectMetrics};
use crate::core::visitor::{walk_graph, ArtifactVisitor, VisitScope};
use crate::io::cache::SharedCacheDriver;

pub const ID: &str = "cyclomatic";

/// `ccn` and `ccn2` for one token stream
pub fn complexity(tokens: &[Token]) -> (u32, u32) {
    let body = tokens
        .iter()
        .position(|token| token.kind == TokenKind::CurlyBraceOpen)
        .map_or(&[][..], |start| &tokens[start..]);

    let mut ccn = 1;
    let mut boolean = 0;
    for token in body {
        match token.kind {
            TokenKind::If
            | TokenKind::ElseIf
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Case
            | TokenKind::Catch
            | TokenKind::QuestionMark => ccn += 1,
            TokenKind::BooleanAnd
            | TokenKind::BooleanOr
            | TokenKind::LogicalAnd
            | TokenKind::LogicalOr => boolean += 1,
            _ => {}
        }
    }
    (ccn, ccn + boolean)
}

#[derive(Debug, Default)]
pub struct CyclomaticAnalyzer {
    state: AnalysisState,
    cache: MetricsCache,
    metrics: MetricsTable,
    project: ProjectMetrics,
}

impl CyclomaticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `ccn` of a callable, zero when it was not analyzed
    pub fn ccn(&self, callable: &ArtifactMeta) -> f64 {
        self.metrics.value(&callable.key, "ccn").unwrap_or(0.0)
    }

    fn visit_callable(&mut self, scope: &mut VisitScope<'_>, callable: &Callable) {
        scope.fire_start(&callable.meta);
        if !self.cache.restore(&callable.meta, &mut self.metrics) {
            let (ccn, ccn2) = complexity(&callable.meta.tokens);
            self.metrics.insert(
                callable.meta.key.clone(),
                node_metrics([("ccn", f64::from(ccn)), ("ccn2", f64::from(ccn2))]),
            );
        }
        if let Some(metrics) = self.metrics.get(&callable.meta.key) {
            self.project.add_node(metrics, &["ccn", "ccn2"]);
        }
        scope.fire_end(&callable.meta);
    }
}

impl ArtifactVisitor for CyclomaticAnalyzer {
    fn visit_function(&mut self, scope: &mut VisitScope<'_>, function: &Callable) {
        self.visit_callable(scope, function);
    }

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {
        self.visit_callable(scope, method);
    }
}

impl Analyzer for CyclomaticAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn analyze(&mut self, graph: &ArtifactGraph, context: &mut AnalysisContext) -> Result<()> {
        if !self.state.begin() {
            return Ok(());
        }
        context.fire_start_analyzer(ID);
        self.metrics.clear();
        self.project.clear();
        self.cache.load(ID);

        let mut scope = VisitScope::new(graph, context, ID);
        walk_graph(self, &mut scope);

        self.cache.unload(ID, &self.metrics);
        context.fire_end_analyzer(ID);
        self.state.finish();
        Ok(())
    }

    fn state(&self) -> AnalysisState {
        self.state
    }

    fn as_node_aware(&self) -> Option<&dyn NodeAware> {
        Some(self)
    }

    fn as_project_aware(&self) -> Option<&dyn ProjectAware> {
        Some(self)
    }

    fn as_cache_aware(&mut self) -> Option<&mut dyn CacheAware> {
        Some(self)
    }
}

impl NodeAware for CyclomaticAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}

impl ProjectAware for CyclomaticAnalyzer {
    fn project_metrics(&self) -> NodeMetrics {
        node_metrics([("ccn", self.project.get("ccn")), ("ccn2", self.project.get("ccn2"))])
    }
}

impl CacheAware for CyclomaticAnalyzer {
    fn set_cache(&mut self, driver: SharedCacheDriver) {
        self.cache.set_driver(driver);
    }

    fn cache(&self) -> Option<SharedCacheDriver> {
        self.cache.driver()
    }
}
