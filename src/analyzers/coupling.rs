//! Afferent/efferent coupling between types, plus project-wide fan-out and
//! distinct call counts.
//!
//! A reference between two types related by inheritance (either direction)
//! is not coupling and is never recorded.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::analyzers::{AnalysisState, Analyzer, NodeAware, ProjectAware};
use crate::core::artifact::{ArtifactGraph, ArtifactMeta, Callable, NodeId, Property, TypeDecl};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics};
use crate::core::visitor::{walk_graph, walk_type, ArtifactVisitor, VisitScope};

pub const ID: &str = "coupling";

#[derive(Debug, Default, Clone)]
struct CouplingSets {
    afferent: BTreeSet<NodeId>,
    efferent: BTreeSet<NodeId>,
}

#[derive(Debug, Default)]
pub struct CouplingAnalyzer {
    state: AnalysisState,
    dependencies: BTreeMap<NodeId, CouplingSets>,
    metrics: MetricsTable,
    calls: usize,
    fanout: usize,
}

impl CouplingAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Types depending on `type_id`
    pub fn afferent(&self, type_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.dependencies
            .get(&type_id)
            .into_iter()
            .flat_map(|sets| sets.afferent.iter().copied())
    }

    /// Types `type_id` depends on
    pub fn efferent(&self, type_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.dependencies
            .get(&type_id)
            .into_iter()
            .flat_map(|sets| sets.efferent.iter().copied())
    }

    fn couple(&mut self, graph: &ArtifactGraph, declaring: NodeId, coupled: NodeId) {
        if graph.type_decl(coupled).is_none() {
            debug!("skipping dangling type reference {}", coupled);
            return;
        }
        if graph.is_subtype_of(coupled, declaring) || graph.is_subtype_of(declaring, coupled) {
            return;
        }
        self.dependencies
            .entry(declaring)
            .or_default()
            .efferent
            .insert(coupled);
        self.dependencies
            .entry(coupled)
            .or_default()
            .afferent
            .insert(declaring);
    }

    fn count_calls(&mut self, callable: &Callable) {
        let distinct: HashSet<String> = callable.calls.iter().map(|call| call.signature()).collect();
        self.calls += distinct.len();
    }

    fn visit_type(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        scope.fire_start(&decl.meta);
        self.dependencies.entry(decl.meta.id).or_default();
        walk_type(self, scope, decl);
        scope.fire_end(&decl.meta);
    }

    fn finish(&mut self, graph: &ArtifactGraph) {
        for (&id, sets) in &self.dependencies {
            let Some(meta) = graph.meta(id) else {
                continue;
            };
            self.fanout += sets.efferent.len();
            let ca = sets.afferent.len() as f64;
            let ce = sets.efferent.len() as f64;
            self.metrics
                .insert(meta.key.clone(), node_metrics([("ca", ca), ("cbo", ce), ("ce", ce)]));
        }
    }
}

impl ArtifactVisitor for CouplingAnalyzer {
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
        scope.fire_start(&function.meta);
        let targets: BTreeSet<NodeId> = function
            .dependencies
            .iter()
            .map(|dependency| dependency.target)
            .filter(|&target| scope.graph.type_decl(target).is_some())
            .collect();
        self.fanout += targets.len();
        self.count_calls(function);
        scope.fire_end(&function.meta);
    }

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {
        scope.fire_start(&method.meta);
        if let Some(owner) = method.owner {
            let graph = scope.graph;
            // return type, thrown types, then every other reference
            for dependency in &method.dependencies {
                self.couple(graph, owner, dependency.target);
            }
        }
        self.count_calls(method);
        scope.fire_end(&method.meta);
    }

    fn visit_property(&mut self, scope: &mut VisitScope<'_>, property: &Property) {
        scope.fire_start(&property.meta);
        if let (Some(owner), Some(type_ref)) = (property.owner, property.type_ref) {
            self.couple(scope.graph, owner, type_ref);
        }
        scope.fire_end(&property.meta);
    }
}

impl Analyzer for CouplingAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn analyze(&mut self, graph: &ArtifactGraph, context: &mut AnalysisContext) -> Result<()> {
        if !self.state.begin() {
            return Ok(());
        }
        context.fire_start_analyzer(ID);
        self.dependencies.clear();
        self.metrics.clear();
        self.calls = 0;
        self.fanout = 0;

        let mut scope = VisitScope::new(graph, context, ID);
        walk_graph(self, &mut scope);
        self.finish(graph);

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

impl NodeAware for CouplingAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}

impl ProjectAware for CouplingAnalyzer {
    fn project_metrics(&self) -> NodeMetrics {
        node_metrics([("calls", self.calls as f64), ("fanout", self.fanout as f64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::{CallSite, Declaration, DependencyKind};

    #[test]
    fn counts_distinct_coupled_types() {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let service = graph.add_class(app, Declaration::new("Service")).unwrap();
        let repo = graph.add_class(app, Declaration::new("Repo")).unwrap();
        let error = graph.add_class(app, Declaration::new("Error")).unwrap();
        let run = graph.add_method(service, Declaration::new("run")).unwrap();
        graph.add_dependency(run, repo, DependencyKind::Return).unwrap();
        graph.add_dependency(run, repo, DependencyKind::Parameter).unwrap();
        graph.add_dependency(run, error, DependencyKind::Throws).unwrap();

        let mut analyzer = CouplingAnalyzer::new();
        analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

        let service_metrics = analyzer.node_metrics(graph.meta(service).unwrap());
        assert_eq!(service_metrics["ce"], 2.0);
        assert_eq!(service_metrics["cbo"], 2.0);
        assert_eq!(service_metrics["ca"], 0.0);
        assert_eq!(analyzer.node_metrics(graph.meta(repo).unwrap())["ca"], 1.0);
        assert_eq!(analyzer.project_metrics()["fanout"], 2.0);
    }

    #[test]
    fn inheritance_is_not_coupling() {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let base = graph.add_class(app, Declaration::new("Base")).unwrap();
        let child = graph.add_class(app, Declaration::new("Child")).unwrap();
        graph.set_parent(child, base).unwrap();
        let up = graph.add_method(child, Declaration::new("up")).unwrap();
        let down = graph.add_method(base, Declaration::new("down")).unwrap();
        graph.add_dependency(up, base, DependencyKind::Return).unwrap();
        graph.add_dependency(down, child, DependencyKind::Allocation).unwrap();

        let mut analyzer = CouplingAnalyzer::new();
        analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

        assert_eq!(analyzer.efferent(child).count(), 0);
        assert_eq!(analyzer.efferent(base).count(), 0);
        assert_eq!(analyzer.node_metrics(graph.meta(base).unwrap())["ca"], 0.0);
    }

    #[test]
    fn identical_calls_count_once_per_callable() {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let f = graph.add_function(app, Declaration::new("f")).unwrap();
        let g = graph.add_function(app, Declaration::new("g")).unwrap();
        for callable in [f, g] {
            graph.add_call(callable, CallSite::new(Some("$log"), "info")).unwrap();
            graph.add_call(callable, CallSite::new(Some("$log"), "info")).unwrap();
            graph.add_call(callable, CallSite::new(None, "info")).unwrap();
        }

        let mut analyzer = CouplingAnalyzer::new();
        analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

        assert_eq!(analyzer.project_metrics()["calls"], 4.0);
    }

    #[test]
    fn property_types_couple() {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let holder = graph.add_class(app, Declaration::new("Holder")).unwrap();
        let value = graph.add_class(app, Declaration::new("Value")).unwrap();
        let field = graph.add_property(holder, Declaration::new("value")).unwrap();
        graph.set_property_type(field, value).unwrap();

        let mut analyzer = CouplingAnalyzer::new();
        analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

        assert_eq!(analyzer.efferent(holder).collect::<Vec<_>>(), vec![value]);
        assert_eq!(analyzer.afferent(value).collect::<Vec<_>>(), vec![holder]);
    }
}
