//! CodeRank: PageRank over the type and namespace dependency graph.
//!
//! `cr` ranks artifacts by how much is built on top of them, `rcr` by how
//! much they build on. The edge set is produced by the configured
//! [`StrategyKind`]s, merged into one [`NodeTable`].

pub mod rank;
pub mod strategy;

use std::collections::HashMap;

use tracing::info;

use crate::analyzers::{AnalysisState, Analyzer, NodeAware};
use crate::core::artifact::{ArtifactGraph, ArtifactMeta, NodeId};
use crate::core::config::CodeRankConfig;
use crate::core::errors::Result;
use crate::core::listener::AnalysisContext;
use crate::core::metrics::{node_metrics, MetricsTable, NodeMetrics};

pub use rank::{RankGraph, RankResult};
pub use strategy::{NodeTable, RankNode, StrategyKind};

pub const ID: &str = "coderank";

#[derive(Debug)]
pub struct CodeRankAnalyzer {
    config: CodeRankConfig,
    strategies: Vec<StrategyKind>,
    state: AnalysisState,
    table: NodeTable,
    code_rank: HashMap<NodeId, f64>,
    reverse_code_rank: HashMap<NodeId, f64>,
    metrics: MetricsTable,
}

impl CodeRankAnalyzer {
    /// Fails when a configured strategy name is unknown
    pub fn new(config: &CodeRankConfig) -> Result<Self> {
        let strategies = config.strategy_kinds()?;
        Ok(Self {
            config: config.clone(),
            strategies,
            state: AnalysisState::default(),
            table: NodeTable::new(),
            code_rank: HashMap::new(),
            reverse_code_rank: HashMap::new(),
            metrics: MetricsTable::new(),
        })
    }

    pub fn strategies(&self) -> &[StrategyKind] {
        &self.strategies
    }

    /// Node table built during the last run
    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    pub fn code_rank(&self, id: NodeId) -> Option<f64> {
        self.code_rank.get(&id).copied()
    }

    pub fn reverse_code_rank(&self, id: NodeId) -> Option<f64> {
        self.reverse_code_rank.get(&id).copied()
    }
}

impl Analyzer for CodeRankAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn analyze(&mut self, graph: &ArtifactGraph, context: &mut AnalysisContext) -> Result<()> {
        if !self.state.begin() {
            return Ok(());
        }
        context.fire_start_analyzer(ID);

        for strategy in &self.strategies {
            strategy.collect(graph, context, ID, &mut self.table);
        }

        let ranked = RankGraph::from_table(&self.table);
        let forward = ranked.code_rank(&self.config);
        let reverse = ranked.reverse_code_rank(&self.config);
        info!(
            "CodeRank over {} nodes: {} iterations (converged: {}), reverse {} iterations (converged: {})",
            ranked.node_count(),
            forward.iterations,
            forward.converged,
            reverse.iterations,
            reverse.converged
        );
        self.code_rank = forward.ranks;
        self.reverse_code_rank = reverse.ranks;

        for node in self.table.iter() {
            let Some(meta) = graph.meta(node.id) else {
                continue;
            };
            let cr = self.code_rank.get(&node.id).copied().unwrap_or(0.0);
            let rcr = self.reverse_code_rank.get(&node.id).copied().unwrap_or(0.0);
            self.metrics
                .insert(meta.key.clone(), node_metrics([("cr", cr), ("rcr", rcr)]));
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
}

impl NodeAware for CodeRankAnalyzer {
    fn node_metrics(&self, artifact: &ArtifactMeta) -> NodeMetrics {
        self.metrics.get(&artifact.key).cloned().unwrap_or_default()
    }
}
