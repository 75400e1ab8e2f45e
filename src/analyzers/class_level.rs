//! Class-level size and complexity metrics.
//!
//! Aggregates the per-method `ccn` of the cyclomatic analyzer it is built
//! with into weighted method counts.

use std::collections::HashSet;

use crate::analyzers::{AnalysisState, Analyzer, NodeAware, SharedAnalyzer};
use crate::core::artifact::{ArtifactGraph, ArtifactKind, ArtifactMeta, TypeDecl, Visibility};
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics};
use crate::core::visitor::{walk_graph, ArtifactVisitor, VisitScope};

pub const ID: &str = "class-level";

/// Analyzers this one reads from
pub const REQUIRES: &[&str] = &[super::cyclomatic::ID];

#[derive(Debug)]
pub struct ClassLevelAnalyzer {
    state: AnalysisState,
    cyclomatic: SharedAnalyzer,
    metrics: MetricsTable,
}

impl ClassLevelAnalyzer {
    pub fn new(cyclomatic: SharedAnalyzer) -> Self {
        Self {
            state: AnalysisState::default(),
            cyclomatic,
            metrics: MetricsTable::new(),
        }
    }

    fn ccn(&self, method: &ArtifactMeta) -> f64 {
        let analyzer = self.cyclomatic.borrow();
        analyzer
            .as_node_aware()
            .and_then(|aware| aware.node_metrics(method).get("ccn").copied())
            .unwrap_or(0.0)
    }

    /// Sum of `ccn` over own methods plus inherited methods that are not
    /// overridden lower in the parent chain
    fn inherited_weight(&self, graph: &ArtifactGraph, decl: &TypeDecl) -> f64 {
        let mut seen = HashSet::new();
        let mut total = 0.0;
        let lineage = std::iter::once(decl.meta.id).chain(graph.parent_chain(decl.meta.id));
        for type_id in lineage {
            let Some(current) = graph.type_decl(type_id) else {
                continue;
            };
            for method in current.methods.iter().filter_map(|&id| graph.callable(id)) {
                if seen.insert(method.meta.name.to_lowercase()) {
                    total += self.ccn(&method.meta);
                }
            }
        }
        total
    }

    fn visit_type(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        scope.fire_start(&decl.meta);
        let graph = scope.graph;

        let implemented = graph
            .ancestors(decl.meta.id)
            .into_iter()
            .filter(|&id| graph.meta(id).map(|meta| meta.kind) == Some(ArtifactKind::Interface))
            .count();
        let methods: Vec<_> = decl
            .methods
            .iter()
            .filter_map(|&id| graph.callable(id))
            .collect();
        let properties: Vec<_> = decl
            .properties
            .iter()
            .filter_map(|&id| graph.property(id))
            .collect();

        let public_methods = methods
            .iter()
            .filter(|method| method.visibility == Visibility::Public)
            .count();
        let public_properties = properties
            .iter()
            .filter(|property| property.visibility == Visibility::Public)
            .count();
        let wmc: f64 = methods.iter().map(|method| self.ccn(&method.meta)).sum();
        let wmci = self.inherited_weight(graph, decl);

        self.metrics.insert(
            decl.meta.key.clone(),
            node_metrics([
                ("impl", implemented as f64),
                ("nom", methods.len() as f64),
                ("vars", properties.len() as f64),
                ("cis", (public_methods + public_properties) as f64),
                ("csz", (methods.len() + properties.len()) as f64),
                ("wmc", wmc),
                ("wmci", wmci),
            ]),
        );
        scope.fire_end(&decl.meta);
    }
}

impl ArtifactVisitor for ClassLevelAnalyzer {
    fn visit_class(&mut self, scope: &mut VisitScope<'_>, class: &TypeDecl) {
        self.visit_type(scope, class);
    }

    fn visit_trait(&mut self, scope: &mut VisitScope<'_>, decl: &TypeDecl) {
        self.visit_type(scope, decl);
    }

    fn visit_interface(&mut self, _: &mut VisitScope<'_>, _: &TypeDecl) {}
}

impl Analyzer for ClassLevelAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn analyze(&mut self, graph: &ArtifactGraph, context: &mut AnalysisContext) -> Result<()> {
        if !self.state.begin() {
            return Ok(());
        }
        self.cyclomatic.borrow_mut().analyze(graph, context)?;
        context.fire_start_analyzer(ID);

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
}

impl NodeAware for ClassLevelAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}
