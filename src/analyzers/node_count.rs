//! Counts of namespaces, classes, interfaces, methods and functions.

use crate::analyzers::{AnalysisState, Analyzer, NodeAware, ProjectAware};
use crate::core::artifact::{ArtifactGraph, ArtifactMeta, Callable, Namespace, TypeDecl};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics, ProjectMetrics};
use crate::core::visitor::{walk_graph, walk_namespace, walk_type, ArtifactVisitor, VisitScope};

pub const ID: &str = "node-count";

#[derive(Debug, Default)]
pub struct NodeCountAnalyzer {
    state: AnalysisState,
    metrics: MetricsTable,
    project: ProjectMetrics,
    current_namespace: Option<String>,
}

impl NodeCountAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_namespace(&mut self, metric: &str) {
        if let Some(key) = &self.current_namespace {
            *self.metrics.entry(key).entry(metric.to_string()).or_insert(0.0) += 1.0;
        }
    }

    fn count(&mut self, metric: &str) {
        self.project.add(metric, 1.0);
        self.bump_namespace(metric);
    }

    fn visit_type(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl, metric: Option<&str>) {
        scope.fire_start(&decl.meta);
        if let Some(metric) = metric {
            self.count(metric);
        }
        self.metrics
            .insert(decl.meta.key.clone(), node_metrics([("nom", decl.methods.len() as f64)]));
        walk_type(self, scope, decl);
        scope.fire_end(&decl.meta);
    }
}

impl ArtifactVisitor for NodeCountAnalyzer {
    fn visit_namespace(&mut self, scope: &mut VisitScope<'_>, namespace: &Namespace) {
        scope.fire_start(&namespace.meta);
        self.project.add("nop", 1.0);
        self.metrics.insert(
            namespace.meta.key.clone(),
            node_metrics([("noc", 0.0), ("noi", 0.0), ("nom", 0.0), ("nof", 0.0)]),
        );
        self.current_namespace = Some(namespace.meta.key.clone());
        walk_namespace(self, scope, namespace);
        self.current_namespace = None;
        scope.fire_end(&namespace.meta);
    }

    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        self.visit_type(scope, class, Some("noc"));
    }

    fn visit_interface(&mut self, scope: &mut VisitScope<'_>, interface: &TypeDecl) {
        self.visit_type(scope, interface, Some("noi"));
    }

    fn visit_trait(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        self.visit_type(scope, decl, None);
    }

    fn visit_function(&mut self, scope: &mut VisitScope<'_>, function: &Callable) {
        scope.fire_start(&function.meta);
        self.count("nof");
        scope.fire_end(&function.meta);
    }

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {
        scope.fire_start(&method.meta);
        self.count("nom");
        scope.fire_end(&method.meta);
    }
}

impl Analyzer for NodeCountAnalyzer {
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

        let mut scope = VisitScope::new(graph, context, ID);
        walk_graph(self, &mut scope);

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
}

impl NodeAware for NodeCountAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}

impl ProjectAware for NodeCountAnalyzer {
    fn project_metrics(&self) -> NodeMetrics {
        ["nop", "noc", "noi", "nom", "nof"]
            .into_iter()
            .map(|name| (name.to_string(), self.project.get(name)))
            .collect()
    }
}
