//! Namespace-level dependency cycle detection.
//!
//! The walk goes namespace → member (type or function) → namespaces the
//! member depends on. Revisiting a namespace that is still on the stack
//! closes a cycle made of the stack slice from that namespace to the top;
//! the walk then unwinds without exploring further.
//!
//! Members whose subtree was fully explored without finding a cycle are
//! remembered by `(namespace, member)` and never walked again. Without this
//! the walk is exponential on diamond-shaped dependency graphs.
//!
//! Stopping at the first cycle hides cycles that are only reachable behind
//! another one, so [`detect_cycles`] finishes with a breadth-first search for
//! a closed path through every namespace not yet covered by a reported cycle.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};

use crate::core::artifact::NodeId;

/// `namespace -> member -> target namespaces`, in declaration order
pub type NamespaceEdges = IndexMap<NodeId, IndexMap<NodeId, IndexSet<NodeId>>>;

#[derive(Debug)]
pub struct CycleDetector<'a> {
    edges: &'a NamespaceEdges,
    stack: Vec<NodeId>,
    on_stack: HashSet<NodeId>,
    clean_members: HashSet<(NodeId, NodeId)>,
    clean_namespaces: HashSet<NodeId>,
}

impl<'a> CycleDetector<'a> {
    pub fn new(edges: &'a NamespaceEdges) -> Self {
        Self {
            edges,
            stack: Vec::new(),
            on_stack: HashSet::new(),
            clean_members: HashSet::new(),
            clean_namespaces: HashSet::new(),
        }
    }

    /// First cycle reachable from `start`, in stack order
    pub fn find_cycle(&mut self, start: NodeId) -> Option<Vec<NodeId>> {
        self.stack.clear();
        self.on_stack.clear();
        self.visit(start)
    }

    /// Whether `namespace` is known to reach no cycle
    pub fn is_clean(&self, namespace: NodeId) -> bool {
        self.clean_namespaces.contains(&namespace)
    }

    fn visit(&mut self, namespace: NodeId) -> Option<Vec<NodeId>> {
        if self.on_stack.contains(&namespace) {
            let start = self.stack.iter().position(|&id| id == namespace)?;
            return Some(self.stack[start..].to_vec());
        }
        if self.clean_namespaces.contains(&namespace) {
            return None;
        }

        self.stack.push(namespace);
        self.on_stack.insert(namespace);

        let edges = self.edges;
        if let Some(members) = edges.get(&namespace) {
            for (&member, targets) in members {
                if self.clean_members.contains(&(namespace, member)) {
                    continue;
                }
                for &target in targets {
                    if let Some(cycle) = self.visit(target) {
                        self.pop(namespace);
                        return Some(cycle);
                    }
                }
                self.clean_members.insert((namespace, member));
            }
        }

        self.pop(namespace);
        self.clean_namespaces.insert(namespace);
        None
    }

    /// Shortest closed path leaving and re-entering `start`, in walk order
    pub fn cycle_through(&self, start: NodeId) -> Option<Vec<NodeId>> {
        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(namespace) = queue.pop_front() {
            for target in self.targets(namespace) {
                if target == start {
                    let mut path = vec![namespace];
                    let mut current = namespace;
                    while current != start {
                        let Some(&previous) = parent.get(&current) else {
                            break;
                        };
                        path.push(previous);
                        current = previous;
                    }
                    path.reverse();
                    return Some(path);
                }
                if !parent.contains_key(&target) {
                    parent.insert(target, namespace);
                    queue.push_back(target);
                }
            }
        }
        None
    }

    fn targets(&self, namespace: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        let edges = self.edges;
        edges
            .get(&namespace)
            .into_iter()
            .flat_map(|members| members.values().flat_map(|targets| targets.iter().copied()))
    }

    fn pop(&mut self, namespace: NodeId) {
        self.stack.pop();
        self.on_stack.remove(&namespace);
    }
}

/// Every distinct cycle found by walking from each namespace in order,
/// completed so that each namespace lying on any cycle belongs to at least
/// one reported cycle. Cycles are normalized to ascending id order.
pub fn detect_cycles(edges: &NamespaceEdges, namespaces: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut detector = CycleDetector::new(edges);
    let mut seen = HashSet::new();
    let mut cycles = Vec::new();
    let mut record = |mut cycle: Vec<NodeId>, cycles: &mut Vec<Vec<NodeId>>| {
        cycle.sort();
        if seen.insert(cycle.clone()) {
            cycles.push(cycle);
        }
    };

    for &namespace in namespaces {
        if let Some(cycle) = detector.find_cycle(namespace) {
            record(cycle, &mut cycles);
        }
    }

    let mut covered: HashSet<NodeId> = cycles.iter().flatten().copied().collect();
    for &namespace in namespaces {
        if covered.contains(&namespace) || detector.is_clean(namespace) {
            continue;
        }
        if let Some(cycle) = detector.cycle_through(namespace) {
            covered.extend(cycle.iter().copied());
            record(cycle, &mut cycles);
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NodeId {
        NodeId(n)
    }

    /// One member per edge so each namespace's dependencies are explicit
    fn edges(pairs: &[(u32, u32)]) -> NamespaceEdges {
        let mut edges = NamespaceEdges::new();
        for (index, &(from, to)) in pairs.iter().enumerate() {
            edges
                .entry(id(from))
                .or_default()
                .entry(id(100 + index as u32))
                .or_default()
                .insert(id(to));
        }
        edges
    }

    #[test]
    fn reports_only_the_cycle_members() {
        // P0→P1→P2→P3→P2, P4 isolated
        let graph = edges(&[(0, 1), (1, 2), (2, 3), (3, 2)]);
        let mut detector = CycleDetector::new(&graph);

        let cycle = detector.find_cycle(id(0)).unwrap();

        assert_eq!(cycle, vec![id(2), id(3)]);
        assert!(detector.find_cycle(id(4)).is_none());
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let graph = edges(&[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let mut detector = CycleDetector::new(&graph);
        assert!(detector.find_cycle(id(0)).is_none());
        assert!(detector.is_clean(id(3)));
        assert!(detector.is_clean(id(0)));
    }

    #[test]
    fn distinct_cycles_are_deduplicated() {
        let graph = edges(&[(0, 1), (1, 0), (2, 3), (3, 2), (4, 0)]);
        let cycles = detect_cycles(&graph, &[id(0), id(1), id(2), id(3), id(4)]);
        assert_eq!(cycles, vec![vec![id(0), id(1)], vec![id(2), id(3)]]);
    }

    #[test]
    fn cycle_behind_another_cycle_is_reported() {
        // C's first dependency leads into A⇄B, its second closes C⇄D
        let (a, b, c, d, e) = (0, 1, 2, 3, 4);
        let graph = edges(&[(c, e), (c, d), (d, c), (e, a), (a, b), (b, a)]);

        let cycles = detect_cycles(&graph, &[id(c), id(d), id(e), id(a), id(b)]);

        assert_eq!(cycles, vec![vec![id(a), id(b)], vec![id(c), id(d)]]);
    }

    #[test]
    fn namespace_reaching_a_cycle_through_a_finished_branch_is_covered() {
        // 0⇄1 is found first; 0→2→1 closes a second cycle through 2
        let graph = edges(&[(0, 1), (0, 2), (1, 0), (2, 1)]);

        let cycles = detect_cycles(&graph, &[id(0), id(1), id(2)]);

        assert_eq!(cycles, vec![vec![id(0), id(1)], vec![id(0), id(1), id(2)]]);
    }

    #[test]
    fn closed_path_search_ignores_namespaces_off_any_cycle() {
        let graph = edges(&[(0, 1), (1, 2), (2, 1)]);
        let detector = CycleDetector::new(&graph);
        assert!(detector.cycle_through(id(0)).is_none());
        assert_eq!(detector.cycle_through(id(1)), Some(vec![id(1), id(2)]));
    }

    #[test]
    fn diamond_chains_stay_linear() {
        // 40 stacked diamonds: exponential without memoization
        let mut pairs = Vec::new();
        for level in 0..40u32 {
            let top = level * 3;
            pairs.extend([(top, top + 1), (top, top + 2), (top + 1, top + 3), (top + 2, top + 3)]);
        }
        let graph = edges(&pairs);
        let mut detector = CycleDetector::new(&graph);
        assert!(detector.find_cycle(id(0)).is_none());
    }
}
