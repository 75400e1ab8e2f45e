//! Graph construction strategies for CodeRank.
//!
//! A strategy decides which references become edges. Every edge runs from
//! the depending artifact to the artifact it depends on; type edges are
//! mirrored on the owning namespaces when those differ.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::core::artifact::{ArtifactGraph, ArtifactKind, Callable, NodeId, Property, TypeDecl};
use crate::core::listener::AnalysisContext;
use crate::core::visitor::{walk_graph, walk_type, ArtifactVisitor, VisitScope};

/// Registered strategy names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Edges from a type to its parent class and interfaces
    Inheritance,
    /// Edges from a method's declaring type to its return, thrown and parameter types
    Method,
    /// Edges from a type to the declared types of its properties
    Property,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::Inheritance, Self::Method, Self::Property];

    pub fn name(self) -> &'static str {
        match self {
            Self::Inheritance => "inheritance",
            Self::Method => "method",
            Self::Property => "property",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Walk `graph` and add this strategy's edges to `table`
    pub fn collect(
        self,
        graph: &ArtifactGraph,
        context: &mut AnalysisContext,
        analyzer: &'static str,
        table: &mut NodeTable,
    ) {
        let mut scope = VisitScope::new(graph, context, analyzer);
        let mut visitor = StrategyVisitor { kind: self, table };
        walk_graph(&mut visitor, &mut scope);
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One ranked artifact with its de-duplicated edges
#[derive(Debug, Clone, PartialEq)]
pub struct RankNode {
    pub id: NodeId,
    pub name: String,
    pub kind: ArtifactKind,
    /// Artifacts this one depends on
    pub dependencies: IndexSet<NodeId>,
    /// Artifacts depending on this one
    pub dependents: IndexSet<NodeId>,
}

/// Nodes and edges collected by one or more strategies
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: IndexMap<NodeId, RankNode>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&RankNode> {
        self.nodes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankNode> {
        self.nodes.values()
    }

    /// Register an artifact without edges
    pub fn ensure(&mut self, graph: &ArtifactGraph, id: NodeId) {
        if self.nodes.contains_key(&id) {
            return;
        }
        let Some(meta) = graph.meta(id) else {
            return;
        };
        self.nodes.insert(
            id,
            RankNode {
                id,
                name: meta.qualified_name.clone(),
                kind: meta.kind,
                dependencies: IndexSet::new(),
                dependents: IndexSet::new(),
            },
        );
    }

    /// Register a type together with its namespace
    pub fn ensure_type(&mut self, graph: &ArtifactGraph, type_id: NodeId) {
        if let Some(namespace) = graph.namespace_of(type_id) {
            self.ensure(graph, namespace);
        }
        self.ensure(graph, type_id);
    }

    /// Record that `source` depends on `target`; self edges are dropped
    pub fn add_edge(&mut self, graph: &ArtifactGraph, source: NodeId, target: NodeId) {
        if source == target {
            return;
        }
        self.ensure(graph, source);
        self.ensure(graph, target);
        if !(self.nodes.contains_key(&source) && self.nodes.contains_key(&target)) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&source) {
            node.dependencies.insert(target);
        }
        if let Some(node) = self.nodes.get_mut(&target) {
            node.dependents.insert(source);
        }
    }

    /// Type edge plus the namespace edge when both sides live in different namespaces
    pub fn add_type_dependency(&mut self, graph: &ArtifactGraph, source: NodeId, target: NodeId) {
        if graph.type_decl(target).is_none() {
            debug!("skipping non-type dependency target {}", target);
            return;
        }
        self.ensure_type(graph, source);
        self.ensure_type(graph, target);
        self.add_edge(graph, source, target);

        match (graph.namespace_of(source), graph.namespace_of(target)) {
            (Some(from), Some(to)) if from != to => self.add_edge(graph, from, to),
            (Some(_), Some(_)) => {}
            _ => debug!("skipping namespace edge {} -> {}", source, target),
        }
    }
}

struct StrategyVisitor<'t> {
    kind: StrategyKind,
    table: &'t mut NodeTable,
}

impl StrategyVisitor<'_> {
    fn visit_type(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        scope.fire_start(&decl.meta);
        let graph = scope.graph;
        self.table.ensure_type(graph, decl.meta.id);
        if self.kind == StrategyKind::Inheritance {
            for supertype in decl.parent.iter().chain(&decl.interfaces) {
                self.table.add_type_dependency(graph, decl.meta.id, *supertype);
            }
        }
        walk_type(self, scope, decl);
        scope.fire_end(&decl.meta);
    }
}

impl ArtifactVisitor for StrategyVisitor<'_> {
    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        self.visit_type(scope, class);
    }

    fn visit_interface(&mut self, scope: &mut VisitScope<'_>, interface: &TypeDecl) {
        self.visit_type(scope, interface);
    }

    fn visit_trait(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        self.visit_type(scope, decl);
    }

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {
        if self.kind != StrategyKind::Method {
            return;
        }
        let Some(owner) = method.owner else {
            return;
        };
        scope.fire_start(&method.meta);
        let graph = scope.graph;
        let targets = method
            .return_type()
            .into_iter()
            .chain(method.exceptions())
            .chain(method.parameter_types());
        for target in targets {
            self.table.add_type_dependency(graph, owner, target);
        }
        scope.fire_end(&method.meta);
    }

    fn visit_property(&mut self, scope: &mut VisitScope<'_>, property: &Property) {
        if self.kind != StrategyKind::Property {
            return;
        }
        if let (Some(owner), Some(type_ref)) = (property.owner, property.type_ref) {
            scope.fire_start(&property.meta);
            self.table.add_type_dependency(scope.graph, owner, type_ref);
            scope.fire_end(&property.meta);
        }
    }
}
