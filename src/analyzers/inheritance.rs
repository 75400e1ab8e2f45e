//! Inheritance metrics of user-defined classes.

use std::collections::{BTreeMap, HashMap};

use crate::analyzers::{AnalysisState, Analyzer, NodeAware, ProjectAware};
use crate::core::artifact::{ArtifactGraph, ArtifactMeta, NodeId, TypeDecl};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics};
use crate::core::visitor::{walk_graph, ArtifactVisitor, VisitScope};

pub const ID: &str = "inheritance";

#[derive(Debug, Default, Clone, Copy)]
struct ClassStats {
    dit: usize,
    added: usize,
    overridden: usize,
}

#[derive(Debug, Default)]
pub struct InheritanceAnalyzer {
    state: AnalysisState,
    classes: BTreeMap<NodeId, ClassStats>,
    children: HashMap<NodeId, usize>,
    /// deepest DIT seen below each hierarchy root
    roots: BTreeMap<NodeId, usize>,
    derived_classes: usize,
    max_dit: usize,
    metrics: MetricsTable,
}

impl InheritanceAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Methods added and overridden relative to all ancestors. Implementing
    /// an abstract ancestor method counts as neither.
    fn method_changes(graph: &ArtifactGraph, decl: &TypeDecl, ancestors: &[NodeId]) -> (usize, usize) {
        if ancestors.is_empty() {
            return (0, 0);
        }
        let mut inherited: HashMap<String, bool> = HashMap::new();
        for &ancestor in ancestors {
            let Some(parent) = graph.type_decl(ancestor) else {
                continue;
            };
            for callable in parent.methods.iter().filter_map(|&id| graph.callable(id)) {
                inherited
                    .entry(callable.meta.name.to_lowercase())
                    .or_insert(callable.is_abstract);
            }
        }

        let mut added = 0;
        let mut overridden = 0;
        for method in decl.methods.iter().filter_map(|&id| graph.callable(id)) {
            match inherited.get(&method.meta.name.to_lowercase()) {
                Some(false) => overridden += 1,
                Some(true) => {}
                None => added += 1,
            }
        }
        (added, overridden)
    }
}

impl ArtifactVisitor for InheritanceAnalyzer {
    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        if !class.user_defined {
            return;
        }
        scope.fire_start(&class.meta);
        let graph = scope.graph;
        let id = class.meta.id;

        let chain = graph.parent_chain(id);
        let dit = chain.len();
        let root = chain.last().copied().unwrap_or(id);
        self.max_dit = self.max_dit.max(dit);
        let deepest = self.roots.entry(root).or_insert(0);
        *deepest = (*deepest).max(dit);

        self.children.entry(id).or_insert(0);
        if let Some(parent) = class.parent.filter(|&parent| {
            graph
                .type_decl(parent)
                .map_or(false, |decl| decl.user_defined)
        }) {
            self.derived_classes += 1;
            *self.children.entry(parent).or_insert(0) += 1;
        }

        let (added, overridden) = Self::method_changes(graph, class, &chain);
        self.classes.insert(
            id,
            ClassStats {
                dit,
                added,
                overridden,
            },
        );
        scope.fire_end(&class.meta);
    }
}

impl Analyzer for InheritanceAnalyzer {
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

        for (&id, stats) in &self.classes {
            let Some(meta) = graph.meta(id) else {
                continue;
            };
            let noc = self.children.get(&id).copied().unwrap_or(0);
            self.metrics.insert(
                meta.key.clone(),
                node_metrics([
                    ("dit", stats.dit as f64),
                    ("noc", noc as f64),
                    ("noam", stats.added as f64),
                    ("noom", stats.overridden as f64),
                ]),
            );
        }

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

impl NodeAware for InheritanceAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}

impl ProjectAware for InheritanceAnalyzer {
    fn project_metrics(&self) -> NodeMetrics {
        let andc = if self.classes.is_empty() {
            0.0
        } else {
            self.derived_classes as f64 / self.classes.len() as f64
        };
        let ahh = if self.roots.is_empty() {
            0.0
        } else {
            self.roots.values().sum::<usize>() as f64 / self.roots.len() as f64
        };
        node_metrics([("andc", andc), ("ahh", ahh), ("maxDIT", self.max_dit as f64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::Declaration;
    use approx::assert_relative_eq;

    #[test]
    fn hierarchy_metrics() {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let base = graph.add_class(app, Declaration::new("Base")).unwrap();
        let run = graph.add_method(base, Declaration::new("run")).unwrap();
        graph.set_abstract(run, true).unwrap();
        graph.add_method(base, Declaration::new("stop")).unwrap();

        let middle = graph.add_class(app, Declaration::new("Middle")).unwrap();
        graph.set_parent(middle, base).unwrap();
        graph.add_method(middle, Declaration::new("run")).unwrap();
        graph.add_method(middle, Declaration::new("Stop")).unwrap();
        graph.add_method(middle, Declaration::new("extra")).unwrap();

        let leaf = graph.add_class(app, Declaration::new("Leaf")).unwrap();
        graph.set_parent(leaf, middle).unwrap();
        let lone = graph.add_class(app, Declaration::new("Lone")).unwrap();

        let mut analyzer = InheritanceAnalyzer::new();
        analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

        let middle_metrics = analyzer.node_metrics(graph.meta(middle).unwrap());
        assert_eq!(middle_metrics["dit"], 1.0);
        assert_eq!(middle_metrics["noc"], 1.0);
        assert_eq!(middle_metrics["noam"], 1.0);
        assert_eq!(middle_metrics["noom"], 1.0);
        assert_eq!(analyzer.node_metrics(graph.meta(leaf).unwrap())["dit"], 2.0);
        assert_eq!(analyzer.node_metrics(graph.meta(lone).unwrap())["noc"], 0.0);

        let project = analyzer.project_metrics();
        assert_eq!(project["maxDIT"], 2.0);
        assert_relative_eq!(project["andc"], 0.5);
        // roots: Base (deepest 2) and Lone (0)
        assert_relative_eq!(project["ahh"], 1.0);
    }

    #[test]
    fn library_classes_are_ignored() {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let vendor = graph.add_class(app, Declaration::new("Vendor")).unwrap();
        graph.set_user_defined(vendor, false).unwrap();
        let own = graph.add_class(app, Declaration::new("Own")).unwrap();
        graph.set_parent(own, vendor).unwrap();

        let mut analyzer = InheritanceAnalyzer::new();
        analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

        assert!(analyzer.node_metrics(graph.meta(vendor).unwrap()).is_empty());
        assert_eq!(analyzer.node_metrics(graph.meta(own).unwrap())["dit"], 1.0);
        assert_eq!(analyzer.project_metrics()["andc"], 0.0);
    }
}
