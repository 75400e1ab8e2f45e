//! Visitor protocol over the artifact graph.
//!
//! Every analyzer implements [`ArtifactVisitor`] and overrides only the
//! artifact kinds it measures. The default methods descend through the
//! `walk_*` functions, which fix the traversal order once:
//!
//! ```text
//! namespace
//!   ├─ classes, then interfaces, then traits (declaration order)
//!   │    ├─ methods
//!   │    └─ properties
//!   └─ functions
//! ```
//!
//! The compilation unit declaring a type or function is visited right before
//! that declaration, so a unit with several declarations is seen several times.

use crate::core::artifact::{
    Artifact, ArtifactGraph, ArtifactKind, ArtifactMeta, Callable, CompilationUnit, Namespace,
    NodeId, Property, TypeDecl,
};
use crate::core::listener::AnalysisContext;

/// Graph, listeners and analyzer identity for one traversal.
pub struct VisitScope<'a> {
    pub graph: &'a ArtifactGraph,
    context: &'a mut AnalysisContext,
    analyzer: &'static str,
}

impl<'a> VisitScope<'a> {
    pub fn new(graph: &'a ArtifactGraph, context: &'a mut AnalysisContext, analyzer: &'static str) -> Self {
        Self {
            graph,
            context,
            analyzer,
        }
    }

    pub fn analyzer(&self) -> &'static str {
        self.analyzer
    }

    pub fn fire_start(&mut self, artifact: &ArtifactMeta) {
        self.context.fire_start_visit(self.analyzer, artifact);
    }

    pub fn fire_end(&mut self, artifact: &ArtifactMeta) {
        self.context.fire_end_visit(self.analyzer, artifact);
    }
}

#[allow(unused_variables)]
pub trait ArtifactVisitor {
    fn visit_compilation_unit(&mut self, scope: &mut VisitScope<'_>, unit: &CompilationUnit) {}

    fn visit_namespace(&mut self, scope: &mut VisitScope<'_>, namespace: &Namespace) {
        walk_namespace(self, scope, namespace);
    }

    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        walk_type(self, scope, class);
    }

    fn visit_interface(&mut self, scope: &mut VisitScope<'_>, interface: &TypeDecl) {
        walk_type(self, scope, interface);
    }

    fn visit_trait(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        walk_type(self, scope, decl);
    }

    fn visit_function(&mut self, scope: &mut VisitScope<'_>, function: &Callable) {}

    fn visit_method(&mut self, scope: &mut VisitScope<'_>, method: &Callable) {}

    fn visit_property(&mut self, scope: &mut VisitScope<'_>, property: &Property) {}
}

/// Visit every namespace of the graph in creation order
pub fn walk_graph<V: ArtifactVisitor + ?Sized>(visitor: &mut V, scope: &mut VisitScope<'_>) {
    let graph = scope.graph;
    for namespace in graph.namespaces() {
        visitor.visit_namespace(scope, namespace);
    }
}

pub fn walk_namespace<V: ArtifactVisitor + ?Sized>(
    visitor: &mut V,
    scope: &mut VisitScope<'_>,
    namespace: &Namespace,
) {
    let graph = scope.graph;
    for kind in [ArtifactKind::Class, ArtifactKind::Interface, ArtifactKind::Trait] {
        for &id in &namespace.types {
            if let Some(artifact) = graph.get(id).filter(|artifact| artifact.kind() == kind) {
                visit_declaring_unit(visitor, scope, artifact.meta().unit);
                walk_artifact(visitor, scope, artifact);
            }
        }
    }
    for &id in &namespace.functions {
        if let Some(artifact) = graph.get(id) {
            visit_declaring_unit(visitor, scope, artifact.meta().unit);
            walk_artifact(visitor, scope, artifact);
        }
    }
}

/// Visit the methods then the properties of a type
pub fn walk_type<V: ArtifactVisitor + ?Sized>(visitor: &mut V, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
    let graph = scope.graph;
    for &id in decl.methods.iter().chain(&decl.properties) {
        if let Some(artifact) = graph.get(id) {
            walk_artifact(visitor, scope, artifact);
        }
    }
}

/// Dispatch one artifact to the matching visit method
pub fn walk_artifact<V: ArtifactVisitor + ?Sized>(
    visitor: &mut V,
    scope: &mut VisitScope<'_>,
    artifact: &Artifact,
) {
    match artifact {
        Artifact::CompilationUnit(unit) => visitor.visit_compilation_unit(scope, unit),
        Artifact::Namespace(namespace) => visitor.visit_namespace(scope, namespace),
        Artifact::Class(decl) => visitor.visit_class(scope, decl),
        Artifact::Interface(decl) => visitor.visit_interface(scope, decl),
        Artifact::Trait(decl) => visitor.visit_trait(scope, decl),
        Artifact::Function(callable) => visitor.visit_function(scope, callable),
        Artifact::Method(callable) => visitor.visit_method(scope, callable),
        Artifact::Property(property) => visitor.visit_property(scope, property),
    }
}

fn visit_declaring_unit<V: ArtifactVisitor + ?Sized>(
    visitor: &mut V,
    scope: &mut VisitScope<'_>,
    unit: Option<NodeId>,
) {
    let graph = scope.graph;
    if let Some(unit) = unit.and_then(|id| graph.unit(id)) {
        visitor.visit_compilation_unit(scope, unit);
    }
}
