use super::*;
use crate::core::artifact::{Declaration, DependencyKind};
use approx::assert_relative_eq;

/// Each namespace `P{n}` holds one class whose single method returns the
/// class of every namespace listed in `deps[n]`.
fn chain(deps: &[&[usize]]) -> (ArtifactGraph, Vec<NodeId>) {
    let mut graph = ArtifactGraph::new();
    let mut namespaces = Vec::new();
    let mut classes = Vec::new();
    for index in 0..deps.len() {
        let namespace = graph.namespace(format!("P{}", index));
        classes.push(graph.add_class(namespace, Declaration::new("C")).unwrap());
        namespaces.push(namespace);
    }
    for (index, targets) in deps.iter().enumerate() {
        let method = graph
            .add_method(classes[index], Declaration::new("link"))
            .unwrap();
        for &target in targets.iter() {
            graph
                .add_dependency(method, classes[target], DependencyKind::Return)
                .unwrap();
        }
    }
    (graph, namespaces)
}

#[test]
fn cycle_excludes_namespaces_leading_into_it() {
    // P0→P1→P2→P3→P2, P4 isolated
    let (graph, namespaces) = chain(&[&[1], &[2], &[3], &[2], &[]]);
    let mut analyzer = DependencyAnalyzer::new(DependencyConfig::default());
    analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

    assert_eq!(analyzer.cycles(), &[vec![namespaces[2], namespaces[3]]]);
    assert!(analyzer.cycle_of(namespaces[0]).is_none());
    assert!(analyzer.cycle_of(namespaces[1]).is_none());
    assert!(analyzer.cycle_of(namespaces[4]).is_none());
    assert_eq!(analyzer.project_metrics()["cycles"], 1.0);

    let p3 = analyzer.node_metrics(graph.meta(namespaces[3]).unwrap());
    assert_eq!(p3["cycle"], 1.0);
    let p0 = analyzer.node_metrics(graph.meta(namespaces[0]).unwrap());
    assert_eq!(p0["cycle"], 0.0);
}

#[test]
fn cycle_reached_after_another_cycle_is_still_flagged() {
    // P2 first leads P2→P4→P0⇄P1, then closes P2⇄P3
    let (graph, namespaces) = chain(&[&[1], &[0], &[4, 3], &[2], &[0]]);
    let mut analyzer = DependencyAnalyzer::new(DependencyConfig::default());
    analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

    let flagged: Vec<_> = namespaces
        .iter()
        .map(|&id| analyzer.node_metrics(graph.meta(id).unwrap())["cycle"])
        .collect();
    assert_eq!(flagged, vec![1.0, 1.0, 1.0, 1.0, 0.0]);
    assert_eq!(analyzer.project_metrics()["cycles"], 2.0);
    assert_eq!(
        analyzer.cycle_of(namespaces[3]),
        Some(&[namespaces[2], namespaces[3]][..])
    );
}

#[test]
fn cycle_detection_can_be_disabled() {
    let (graph, _) = chain(&[&[1], &[0]]);
    let mut analyzer = DependencyAnalyzer::new(DependencyConfig {
        detect_cycles: false,
    });
    analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();
    assert!(analyzer.cycles().is_empty());
}

#[test]
fn instability_and_distance() {
    // P0 depends on P1 and P2; P1 depends on P2
    let (graph, namespaces) = chain(&[&[1, 2], &[2], &[]]);
    let mut analyzer = DependencyAnalyzer::new(DependencyConfig::default());
    analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

    let p0 = analyzer.stats(namespaces[0]).unwrap();
    assert_eq!(p0.efferent.len(), 2);
    assert_relative_eq!(p0.instability(), 1.0);
    assert_relative_eq!(p0.distance(), 0.0);

    let p1 = analyzer.stats(namespaces[1]).unwrap();
    assert_relative_eq!(p1.instability(), 0.5);
    assert_relative_eq!(p1.distance(), 0.5);

    let p2 = analyzer.node_metrics(graph.meta(namespaces[2]).unwrap());
    assert_eq!(p2["ca"], 2.0);
    assert_eq!(p2["ce"], 0.0);
    assert_eq!(p2["i"], 0.0);
    assert_eq!(p2["d"], 1.0);
}

#[test]
fn abstractness_counts_abstract_types() {
    let mut graph = ArtifactGraph::new();
    let app = graph.namespace("app");
    graph.add_class(app, Declaration::new("Concrete")).unwrap();
    graph.add_interface(app, Declaration::new("Contract")).unwrap();
    let base = graph.add_class(app, Declaration::new("Base")).unwrap();
    graph.set_abstract(base, true).unwrap();
    graph.add_trait(app, Declaration::new("Helpers")).unwrap();

    let only_abstract = graph.namespace("contracts");
    graph.add_interface(only_abstract, Declaration::new("Port")).unwrap();

    let mut analyzer = DependencyAnalyzer::new(DependencyConfig::default());
    analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

    let stats = analyzer.stats(app).unwrap();
    assert_eq!(stats.total_types, 3);
    assert_eq!(stats.abstract_types, 2);
    assert_relative_eq!(stats.abstractness(), 2.0 / 3.0);
    // no concrete types: abstractness stays zero
    assert_eq!(analyzer.stats(only_abstract).unwrap().abstractness(), 0.0);
}

#[test]
fn inheritance_across_namespaces_is_a_dependency() {
    let mut graph = ArtifactGraph::new();
    let app = graph.namespace("app");
    let lib = graph.namespace("lib");
    let base = graph.add_class(lib, Declaration::new("Base")).unwrap();
    let child = graph.add_class(app, Declaration::new("Child")).unwrap();
    graph.set_parent(child, base).unwrap();

    let mut analyzer = DependencyAnalyzer::new(DependencyConfig::default());
    analyzer.analyze(&graph, &mut AnalysisContext::new()).unwrap();

    assert_eq!(analyzer.efferents(app).collect::<Vec<_>>(), vec![lib]);
    assert_eq!(analyzer.efferents(lib).count(), 0);
}

#[test]
fn second_analyze_is_a_no_op() {
    let (graph, namespaces) = chain(&[&[1], &[]]);
    let mut analyzer = DependencyAnalyzer::new(DependencyConfig::default());
    let mut context = AnalysisContext::new();
    analyzer.analyze(&graph, &mut context).unwrap();
    analyzer.analyze(&graph, &mut context).unwrap();

    assert_eq!(analyzer.stats(namespaces[0]).unwrap().total_types, 1);
}
