//! Damped PageRank over the strategy node table.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use super::strategy::NodeTable;
use crate::core::artifact::NodeId;
use crate::core::config::CodeRankConfig;

/// Result of one rank computation
#[derive(Debug, Clone, Default)]
pub struct RankResult {
    pub ranks: HashMap<NodeId, f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Dependency graph in petgraph form; edges run from dependent to dependency.
#[derive(Debug, Clone)]
pub struct RankGraph {
    graph: DiGraph<NodeId, ()>,
}

impl RankGraph {
    pub fn from_table(table: &NodeTable) -> Self {
        let mut graph = DiGraph::with_capacity(table.len(), 0);
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(table.len());
        for node in table.iter() {
            indices.insert(node.id, graph.add_node(node.id));
        }
        for node in table.iter() {
            for target in &node.dependencies {
                if let (Some(&from), Some(&to)) = (indices.get(&node.id), indices.get(target)) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// CodeRank: rank flows from each artifact to what it depends on
    pub fn code_rank(&self, config: &CodeRankConfig) -> RankResult {
        self.iterate(Direction::Incoming, config)
    }

    /// Reverse CodeRank: rank flows from each artifact to its dependents
    pub fn reverse_code_rank(&self, config: &CodeRankConfig) -> RankResult {
        self.iterate(Direction::Outgoing, config)
    }

    /// `rank[n] = (1 - d) + d * Σ rank[m] / degree[m]` over the sources `m`
    /// reaching `n` in `sources` direction. Hitting the iteration cap is a
    /// soft stop that keeps the last estimate.
    fn iterate(&self, sources: Direction, config: &CodeRankConfig) -> RankResult {
        let damping = config.damping_factor;
        let count = self.graph.node_count();
        let degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| self.graph.neighbors_directed(node, sources.opposite()).count())
            .collect();

        let mut ranks = vec![1.0; count];
        let mut iterations = 0;
        let mut converged = count == 0;

        while !converged && iterations < config.max_iterations {
            let next: Vec<f64> = self
                .graph
                .node_indices()
                .map(|node| {
                    let inflow: f64 = self
                        .graph
                        .neighbors_directed(node, sources)
                        .map(|source| ranks[source.index()] / degree[source.index()] as f64)
                        .sum();
                    (1.0 - damping) + damping * inflow
                })
                .collect();

            let delta = next
                .iter()
                .zip(&ranks)
                .map(|(new, old)| (new - old).abs())
                .fold(0.0, f64::max);
            ranks = next;
            iterations += 1;
            converged = delta < config.convergence_threshold;
        }

        if !converged {
            debug!("rank iteration stopped after {} rounds without converging", iterations);
        }

        let ranks = self
            .graph
            .node_indices()
            .map(|node| (self.graph[node], ranks[node.index()]))
            .collect();
        RankResult {
            ranks,
            iterations,
            converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::{ArtifactGraph, Declaration};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn two_types() -> (ArtifactGraph, NodeId, NodeId, NodeTable) {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let a = graph.add_class(app, Declaration::new("A")).unwrap();
        let b = graph.add_class(app, Declaration::new("B")).unwrap();
        let mut table = NodeTable::new();
        table.ensure(&graph, a);
        table.ensure(&graph, b);
        table.add_edge(&graph, a, b);
        (graph, a, b, table)
    }

    #[test]
    fn dependency_outranks_dependent() {
        let (_, a, b, table) = two_types();
        let result = RankGraph::from_table(&table).code_rank(&CodeRankConfig::default());

        assert!(result.converged);
        assert_relative_eq!(result.ranks[&a], 0.15, epsilon = 1e-9);
        assert_relative_eq!(result.ranks[&b], 0.15 + 0.85 * 0.15, epsilon = 1e-9);
        assert!(result.ranks[&b] > result.ranks[&a]);
    }

    #[test]
    fn reverse_rank_flips_the_order() {
        let (_, a, b, table) = two_types();
        let result = RankGraph::from_table(&table).reverse_code_rank(&CodeRankConfig::default());
        assert!(result.ranks[&a] > result.ranks[&b]);
    }

    #[test]
    fn iteration_cap_is_a_soft_stop() {
        let (_, a, _, table) = two_types();
        let config = CodeRankConfig {
            max_iterations: 1,
            ..CodeRankConfig::default()
        };
        let result = RankGraph::from_table(&table).code_rank(&config);
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert!(result.ranks.contains_key(&a));
    }

    #[test]
    fn empty_table_has_no_ranks() {
        let result = RankGraph::from_table(&NodeTable::new()).code_rank(&CodeRankConfig::default());
        assert!(result.ranks.is_empty());
        assert_eq!(result.iterations, 0);
    }

    proptest! {
        #[test]
        fn ranks_never_drop_below_the_teleport_floor(
            edges in proptest::collection::vec((0usize..6, 0usize..6), 0..20)
        ) {
            let mut graph = ArtifactGraph::new();
            let app = graph.namespace("app");
            let ids: Vec<_> = (0..6)
                .map(|n| graph.add_class(app, Declaration::new(format!("T{}", n))).unwrap())
                .collect();
            let mut table = NodeTable::new();
            for &id in &ids {
                table.ensure(&graph, id);
            }
            for (from, to) in edges {
                table.add_edge(&graph, ids[from], ids[to]);
            }

            let result = RankGraph::from_table(&table).code_rank(&CodeRankConfig::default());
            for rank in result.ranks.values() {
                prop_assert!(*rank >= 0.15 - 1e-12);
                prop_assert!(rank.is_finite());
            }
        }
    }
}
