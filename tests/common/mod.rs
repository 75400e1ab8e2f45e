//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use archmetrics::core::artifact::{ArtifactMeta, DependencyKind, Token, TokenKind};
use archmetrics::core::listener::AnalyzerListener;
use archmetrics::{Analyzer, ArtifactGraph, Declaration, NodeId, NodeMetrics, ReportGenerator, Result};

/// Everything a [`Collector`] was handed
#[derive(Debug, Default)]
pub struct Collected {
    /// `(analyzer, artifact key) -> metrics`, non-empty entries only
    pub nodes: BTreeMap<(String, String), NodeMetrics>,
    pub projects: BTreeMap<String, NodeMetrics>,
    pub logged: Vec<String>,
    pub closed: bool,
}

impl Collected {
    pub fn node(&self, analyzer: &str, meta: &ArtifactMeta) -> NodeMetrics {
        self.nodes
            .get(&(analyzer.to_string(), meta.key.clone()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Report generator that copies every metric it can reach.
pub struct Collector {
    accepted: Vec<&'static str>,
    artifacts: Vec<ArtifactMeta>,
    out: Rc<RefCell<Collected>>,
}

impl ReportGenerator for Collector {
    fn accepted_analyzers(&self) -> Vec<&'static str> {
        self.accepted.clone()
    }

    fn log_analyzer(&mut self, analyzer: &dyn Analyzer) {
        let mut out = self.out.borrow_mut();
        out.logged.push(analyzer.id().to_string());
        if let Some(nodes) = analyzer.as_node_aware() {
            for meta in &self.artifacts {
                let metrics = nodes.node_metrics(meta);
                if !metrics.is_empty() {
                    out.nodes
                        .insert((analyzer.id().to_string(), meta.key.clone()), metrics);
                }
            }
        }
        if let Some(project) = analyzer.as_project_aware() {
            out.projects
                .insert(analyzer.id().to_string(), project.project_metrics());
        }
    }

    fn close(&mut self) -> Result<()> {
        self.out.borrow_mut().closed = true;
        Ok(())
    }
}

pub fn collector(
    accepted: &[&'static str],
    graph: &ArtifactGraph,
) -> (Box<dyn ReportGenerator>, Rc<RefCell<Collected>>) {
    let out = Rc::new(RefCell::new(Collected::default()));
    let generator = Collector {
        accepted: accepted.to_vec(),
        artifacts: graph.iter().map(|artifact| artifact.meta().clone()).collect(),
        out: out.clone(),
    };
    (Box::new(generator), out)
}

/// Records every analyzer start
#[derive(Debug, Clone, Default)]
pub struct StartCounter {
    pub starts: Rc<RefCell<Vec<String>>>,
}

impl StartCounter {
    pub fn count(&self, analyzer: &str) -> usize {
        self.starts
            .borrow()
            .iter()
            .filter(|started| started.as_str() == analyzer)
            .count()
    }
}

impl AnalyzerListener for StartCounter {
    fn start_analyzer(&mut self, analyzer: &str) {
        self.starts.borrow_mut().push(analyzer.to_string());
    }
}

pub fn token(kind: TokenKind, line: u32) -> Token {
    Token::new(kind, kind.tag(), line)
}

/// `function f() {` / three comment lines / `return 1;` / `}` with
/// `decisions` extra `if` tokens on the return line
pub fn function_tokens(decisions: usize) -> Vec<Token> {
    let mut tokens = vec![
        token(TokenKind::Function, 1),
        token(TokenKind::Other, 1),
        token(TokenKind::CurlyBraceOpen, 1),
        Token::spanning(TokenKind::Comment, "/* a\n b\n c */", 2, 4),
    ];
    tokens.extend((0..decisions).map(|_| token(TokenKind::If, 5)));
    tokens.extend([
        token(TokenKind::Other, 5),
        token(TokenKind::Semicolon, 5),
        token(TokenKind::CurlyBraceClose, 6),
    ]);
    tokens
}

/// One file holding class `app\Service` with method `run`, plus a
/// function `helper`
pub struct SmallProject {
    pub graph: ArtifactGraph,
    pub unit: NodeId,
    pub class: NodeId,
    pub method: NodeId,
    pub function: NodeId,
}

pub fn small_project(decisions: usize) -> SmallProject {
    let mut graph = ArtifactGraph::new();
    let unit = graph.add_compilation_unit("src/Service.php", function_tokens(decisions));
    let app = graph.namespace("app");
    let class = graph
        .add_class(app, Declaration::new("Service").in_unit(unit).lines(1, 6))
        .unwrap();
    let method = graph
        .add_method(
            class,
            Declaration::new("run")
                .in_unit(unit)
                .lines(1, 6)
                .with_tokens(function_tokens(decisions)),
        )
        .unwrap();
    let function = graph
        .add_function(
            app,
            Declaration::new("helper")
                .in_unit(unit)
                .lines(1, 6)
                .with_tokens(function_tokens(decisions)),
        )
        .unwrap();
    SmallProject {
        graph,
        unit,
        class,
        method,
        function,
    }
}

/// Namespace `P{n}` holds class `C` whose method returns the class of every
/// namespace listed in `deps[n]`
pub fn namespace_chain(deps: &[&[usize]]) -> (ArtifactGraph, Vec<NodeId>) {
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
