//! Namespace dependency metrics: afferent/efferent coupling, abstractness,
//! instability, distance from the main sequence and dependency cycles.

pub mod cycles;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::analyzers::{AnalysisState, Analyzer, NodeAware, ProjectAware};
use crate::core::artifact::{ArtifactGraph, ArtifactMeta, Callable, Namespace, NodeId, Property, TypeDecl};
use crate::core::config::DependencyConfig;
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics};
use crate::core::visitor::{walk_graph, walk_namespace, walk_type, ArtifactVisitor, VisitScope};

pub use cycles::{detect_cycles, CycleDetector, NamespaceEdges};

pub const ID: &str = "dependency";

/// Raw per-namespace counts collected during traversal
#[derive(Debug, Default, Clone)]
pub struct NamespaceStats {
    pub total_types: usize,
    pub concrete_types: usize,
    pub abstract_types: usize,
    pub afferent: BTreeSet<NodeId>,
    pub efferent: BTreeSet<NodeId>,
}

impl NamespaceStats {
    /// `ac / tc`, or zero for a namespace without concrete types
    pub fn abstractness(&self) -> f64 {
        if self.concrete_types == 0 {
            0.0
        } else {
            self.abstract_types as f64 / self.total_types as f64
        }
    }

    /// `ce / (ca + ce)`, or zero for an uncoupled namespace
    pub fn instability(&self) -> f64 {
        let ca = self.afferent.len();
        let ce = self.efferent.len();
        if ca + ce == 0 {
            0.0
        } else {
            ce as f64 / (ca + ce) as f64
        }
    }

    /// Distance from the main sequence, `|A + I - 1|`
    pub fn distance(&self) -> f64 {
        (self.abstractness() + self.instability() - 1.0).abs()
    }
}

#[derive(Debug, Default)]
pub struct DependencyAnalyzer {
    config: DependencyConfig,
    state: AnalysisState,
    stats: BTreeMap<NodeId, NamespaceStats>,
    edges: NamespaceEdges,
    cycles: Vec<Vec<NodeId>>,
    metrics: MetricsTable,
}

impl DependencyAnalyzer {
    pub fn new(config: DependencyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn stats(&self, namespace: NodeId) -> Option<&NamespaceStats> {
        self.stats.get(&namespace)
    }

    /// Distinct namespace cycles, each sorted by id
    pub fn cycles(&self) -> &[Vec<NodeId>] {
        &self.cycles
    }

    /// The cycle `namespace` belongs to, if any
    pub fn cycle_of(&self, namespace: NodeId) -> Option<&[NodeId]> {
        self.cycles
            .iter()
            .find(|cycle| cycle.contains(&namespace))
            .map(Vec::as_slice)
    }

    /// Namespaces `namespace` depends on
    pub fn efferents(&self, namespace: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.stats
            .get(&namespace)
            .into_iter()
            .flat_map(|stats| stats.efferent.iter().copied())
    }

    fn collect(&mut self, graph: &ArtifactGraph, source: NodeId, member: NodeId, target_type: NodeId) {
        let Some(source_namespace) = graph.namespace_of(source) else {
            debug!("skipping dependency of unowned artifact {}", source);
            return;
        };
        let Some(target_namespace) = graph.namespace_of(target_type) else {
            debug!("skipping dependency on unowned type {}", target_type);
            return;
        };
        if source_namespace == target_namespace {
            return;
        }
        self.stats
            .entry(source_namespace)
            .or_default()
            .efferent
            .insert(target_namespace);
        self.stats
            .entry(target_namespace)
            .or_default()
            .afferent
            .insert(source_namespace);
        self.edges
            .entry(source_namespace)
            .or_default()
            .entry(member)
            .or_default()
            .insert(target_namespace);
    }

    fn visit_type(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl, counted: bool) {
        scope.fire_start(&decl.meta);
        if counted && decl.user_defined {
            if let Some(namespace) = decl.namespace {
                let stats = self.stats.entry(namespace).or_default();
                stats.total_types += 1;
                if decl.is_abstract {
                    stats.abstract_types += 1;
                } else {
                    stats.concrete_types += 1;
                }
            }
        }
        let graph = scope.graph;
        for supertype in decl.supertypes() {
            self.collect(graph, decl.meta.id, decl.meta.id, supertype);
        }
        walk_type(self, scope, decl);
        scope.fire_end(&decl.meta);
    }

    fn visit_callable(&mut self, scope: &mut VisitScope<'_>, callable: &Callable, member: NodeId) {
        scope.fire_start(&callable.meta);
        let graph = scope.graph;
        for dependency in &callable.dependencies {
            self.collect(graph, callable.meta.id, member, dependency.target);
        }
        scope.fire_end(&callable.meta);
    }

    fn finish(&mut self, graph: &ArtifactGraph) {
        if self.config.detect_cycles {
            self.cycles = detect_cycles(&self.edges, graph.namespace_ids());
        }
        for (&id, stats) in &self.stats {
            let Some(meta) = graph.meta(id) else {
                continue;
            };
            let in_cycle = self.cycles.iter().any(|cycle| cycle.contains(&id));
            self.metrics.insert(
                meta.key.clone(),
                node_metrics([
                    ("tc", stats.total_types as f64),
                    ("cc", stats.concrete_types as f64),
                    ("ac", stats.abstract_types as f64),
                    ("ca", stats.afferent.len() as f64),
                    ("ce", stats.efferent.len() as f64),
                    ("a", stats.abstractness()),
                    ("i", stats.instability()),
                    ("d", stats.distance()),
                    ("cycle", if in_cycle { 1.0 } else { 0.0 }),
                ]),
            );
        }
    }
}

impl ArtifactVisitor for DependencyAnalyzer {
    fn visit_namespace(&mut self, scope: &mut VisitScope<'_>, namespace: &Namespace) {
        scope.fire_start(&namespace.meta);
        self.stats.entry(namespace.meta.id).or_default();
        walk_namespace(self, scope, namespace);
        scope.fire_end(&namespace.meta);
    }

    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        self.visit_type(scope, class, true);
    }

    fn visit_interface(&mut self, scope: &mut VisitScope<'_>, interface: &TypeDecl) {
        self.visit_type(scope, interface, true);
    }

    fn visit_trait(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        self.visit_type(scope, decl, false);
    }

    fn visit_function(&mut self, scope: &mut VisitScope<'_>, function: &Callable) {
        self.visit_callable(scope, function, function.meta.id);
    }

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {
        let member = method.owner.unwrap_or(method.meta.id);
        self.visit_callable(scope, method, member);
    }

    fn visit_property(&mut self, scope: &mut VisitScope<'_>, property: &Property) {
        scope.fire_start(&property.meta);
        if let (Some(owner), Some(type_ref)) = (property.owner, property.type_ref) {
            self.collect(scope.graph, property.meta.id, owner, type_ref);
        }
        scope.fire_end(&property.meta);
    }
}

impl Analyzer for DependencyAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn analyze(&mut self, graph: &ArtifactGraph, context: &mut AnalysisContext) -> Result<()> {
        if !self.state.begin() {
            return Ok(());
        }
        context.fire_start_analyzer(ID);

        let mut scope = VisitScope::new(graph, context, ID);
        walk_graph(self, &mut scope);
        self.finish(graph);
        debug!(
            "{} namespaces, {} dependency cycles",
            self.stats.len(),
            self.cycles.len()
        );

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

impl NodeAware for DependencyAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}

impl ProjectAware for DependencyAnalyzer {
    fn project_metrics(&self) -> NodeMetrics {
        node_metrics([("cycles", self.cycles.len() as f64)])
    }
}

#[cfg(test)]
mod tests;
