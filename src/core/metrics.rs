//! Metric containers shared by every analyzer.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metric name to value for one artifact
pub type NodeMetrics = BTreeMap<String, f64>;

/// Build a [`NodeMetrics`] map from name/value pairs
pub fn node_metrics<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> NodeMetrics {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Per-artifact metrics keyed by artifact key, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsTable {
    nodes: IndexMap<String, NodeMetrics>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&NodeMetrics> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Replace the metrics of one artifact
    pub fn insert(&mut self, key: impl Into<String>, metrics: NodeMetrics) {
        self.nodes.insert(key.into(), metrics);
    }

    /// Metrics of one artifact, created empty on first access
    pub fn entry(&mut self, key: &str) -> &mut NodeMetrics {
        self.nodes.entry(key.to_string()).or_default()
    }

    /// Single metric value, if present
    pub fn value(&self, key: &str, metric: &str) -> Option<f64> {
        self.nodes.get(key)?.get(metric).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NodeMetrics)> {
        self.nodes.iter()
    }
}

/// Project-wide accumulator; additive metrics are summed as nodes are processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    values: BTreeMap<String, f64>,
}

impl ProjectMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to a metric, starting from zero
    pub fn add(&mut self, metric: &str, amount: f64) {
        *self.values.entry(metric.to_string()).or_insert(0.0) += amount;
    }

    pub fn set(&mut self, metric: &str, value: f64) {
        self.values.insert(metric.to_string(), value);
    }

    pub fn get(&self, metric: &str) -> f64 {
        self.values.get(metric).copied().unwrap_or(0.0)
    }

    /// Sum every metric of `node` that is listed in `names`
    pub fn add_node(&mut self, node: &NodeMetrics, names: &[&str]) {
        for name in names {
            if let Some(value) = node.get(*name) {
                self.add(name, *value);
            }
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn to_map(&self) -> NodeMetrics {
        self.values.clone()
    }
}
