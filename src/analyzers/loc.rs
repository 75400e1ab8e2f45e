//! Lines-of-code analyzer.
//!
//! Counts physical (`loc`), comment (`cloc`), executable (`eloc`), logical
//! (`lloc`) and non-comment (`ncloc`) lines for files, types and callables.
//! Project metrics are the sum over compilation units only, so a line is
//! never counted once for its file and again for its function.

use std::collections::BTreeSet;

use crate::analyzers::{AnalysisState, Analyzer, CacheAware, MetricsCache, NodeAware, ProjectAware};
use crate::core::artifact::{
    ArtifactGraph, ArtifactMeta, Callable, CompilationUnit, Token, TokenKind, TypeDecl,
};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics, ProjectMetrics};
use crate::core::visitor::{walk_graph, walk_type, ArtifactVisitor, VisitScope};
use crate::io::cache::SharedCacheDriver;

pub const ID: &str = "loc";

const METRICS: [&str; 5] = ["loc", "cloc", "eloc", "lloc", "ncloc"];

/// Line classification of one token range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCounts {
    pub cloc: u32,
    pub eloc: u32,
    pub lloc: u32,
}

/// Classify the lines touched by `tokens`.
///
/// With `from_body` counting starts at the first `{`, which skips the
/// signature and leading doc comment of a function or type; a declaration
/// without a body counts nothing.
pub fn count_lines(tokens: &[Token], from_body: bool) -> LineCounts {
    let start = if from_body {
        tokens
            .iter()
            .position(|token| token.kind == TokenKind::CurlyBraceOpen)
            .unwrap_or(tokens.len())
    } else {
        0
    };

    let mut comment_lines = BTreeSet::new();
    let mut code_lines = BTreeSet::new();
    let mut logical: i64 = 0;

    for token in &tokens[start..] {
        match token.kind {
            TokenKind::If
            | TokenKind::Try
            | TokenKind::Case
            | TokenKind::Goto
            | TokenKind::Catch
            | TokenKind::While
            | TokenKind::Else
            | TokenKind::ElseIf
            | TokenKind::Switch
            | TokenKind::Default
            | TokenKind::Foreach
            | TokenKind::Function
            | TokenKind::Semicolon => logical += 1,
            // the loop header or trailing `while (..);` already carries a semicolon
            TokenKind::Do | TokenKind::For => logical -= 1,
            _ => {}
        }

        let lines = if token.kind.is_comment() {
            &mut comment_lines
        } else {
            &mut code_lines
        };
        lines.extend(token.lines());
    }

    // a line carrying any comment is not an executable line
    LineCounts {
        cloc: comment_lines.len() as u32,
        eloc: code_lines.difference(&comment_lines).count() as u32,
        lloc: logical.max(0) as u32,
    }
}

fn to_metrics(loc: u32, counts: LineCounts) -> NodeMetrics {
    node_metrics([
        ("loc", f64::from(loc)),
        ("cloc", f64::from(counts.cloc)),
        ("eloc", f64::from(counts.eloc)),
        ("lloc", f64::from(counts.lloc)),
        ("ncloc", f64::from(loc.saturating_sub(counts.cloc))),
    ])
}

/// Cache-aware lines-of-code analyzer.
#[derive(Debug, Default)]
pub struct LocAnalyzer {
    state: AnalysisState,
    cache: MetricsCache,
    metrics: MetricsTable,
    project: ProjectMetrics,
}

impl LocAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn visit_callable(&mut self, scope: &mut VisitScope<'_>, callable: &Callable) {
        scope.fire_start(&callable.meta);
        if !self.cache.restore(&callable.meta, &mut self.metrics) {
            let counts = count_lines(&callable.meta.tokens, true);
            self.metrics
                .insert(callable.meta.key.clone(), to_metrics(callable.meta.span.line_count(), counts));
        }
        scope.fire_end(&callable.meta);
    }

    fn visit_type(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        scope.fire_start(&decl.meta);
        let restored = self.cache.restore(&decl.meta, &mut self.metrics);

        walk_type(self, scope, decl);

        if !restored {
            let graph = scope.graph;
            let header = count_lines(&decl.meta.tokens, true);
            let (eloc, lloc) = decl
                .methods
                .iter()
                .filter_map(|&id| graph.meta(id))
                .filter_map(|method| self.metrics.get(&method.key))
                .fold((0.0, 0.0), |(eloc, lloc), method| {
                    (
                        eloc + method.get("eloc").copied().unwrap_or(0.0),
                        lloc + method.get("lloc").copied().unwrap_or(0.0),
                    )
                });
            let mut metrics = to_metrics(decl.meta.span.line_count(), header);
            metrics.insert("eloc".to_string(), eloc);
            metrics.insert("lloc".to_string(), lloc);
            self.metrics.insert(decl.meta.key.clone(), metrics);
        }
        scope.fire_end(&decl.meta);
    }

    fn record_project(&mut self, meta: &ArtifactMeta) {
        if let Some(metrics) = self.metrics.get(&meta.key) {
            self.project.add_node(metrics, &METRICS);
        }
    }
}

impl ArtifactVisitor for LocAnalyzer {
    fn visit_compilation_unit(&mut self, scope: &mut VisitScope<'_>, unit: &CompilationUnit) {
        if self.metrics.contains(&unit.meta.key) {
            return;
        }
        scope.fire_start(&unit.meta);
        if !self.cache.restore(&unit.meta, &mut self.metrics) {
            let counts = count_lines(&unit.meta.tokens, false);
            self.metrics
                .insert(unit.meta.key.clone(), to_metrics(unit.meta.span.end_line, counts));
        }
        self.record_project(&unit.meta);
        scope.fire_end(&unit.meta);
    }

    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        self.visit_type(scope, class);
    }

    fn visit_interface(&mut self, scope: &mut VisitScope<'_>, interface: &TypeDecl) {
        self.visit_type(scope, interface);
    }

    fn visit_trait(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        self.visit_type(scope, decl);
    }

    fn visit_function(&mut self, scope: &mut VisitScope<'_>, function: &Callable) {
        self.visit_callable(scope, function);
    }

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {
        self.visit_callable(scope, method);
    }
}

impl Analyzer for LocAnalyzer {
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

impl NodeAware for LocAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}

impl ProjectAware for LocAnalyzer {
    fn project_metrics(&self) -> NodeMetrics {
        let mut metrics = self.project.to_map();
        for name in METRICS {
            metrics.entry(name.to_string()).or_insert(0.0);
        }
        metrics
    }
}

impl CacheAware for LocAnalyzer {
    fn set_cache(&mut self, driver: SharedCacheDriver) {
        self.cache.set_driver(driver);
    }

    fn cache(&self) -> Option<SharedCacheDriver> {
        self.cache.driver()
    }
}
