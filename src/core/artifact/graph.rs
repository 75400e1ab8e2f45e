//! Arena storage for artifacts plus the mutation API used by parsers.

use std::collections::{HashMap, HashSet, VecDeque};

use sha2::{Digest, Sha256};

use super::fingerprint::fingerprint_tokens;
use super::{
    Artifact, ArtifactKind, ArtifactMeta, CallSite, Callable, CompilationUnit, Dependency,
    DependencyKind, Namespace, NodeId, Property, SourceSpan, Token, TypeDecl, Visibility,
};
use crate::core::errors::{MetricsError, Result};

/// Length of the hex prefix used for artifact keys
const KEY_LENGTH: usize = 24;

/// Name, location and tokens of a declaration handed over by the parser.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub name: String,
    pub unit: Option<NodeId>,
    pub span: Option<SourceSpan>,
    pub tokens: Vec<Token>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare the compilation unit the artifact lives in
    pub fn in_unit(mut self, unit: NodeId) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the inclusive line range
    pub fn lines(mut self, start_line: u32, end_line: u32) -> Self {
        self.span = Some(SourceSpan::new(start_line, end_line));
        self
    }

    /// Attach the raw tokens; the span defaults to the tokens' extent
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }

    fn resolved_span(&self) -> SourceSpan {
        if let Some(span) = self.span {
            return span;
        }
        token_extent(&self.tokens).unwrap_or_default()
    }
}

fn token_extent(tokens: &[Token]) -> Option<SourceSpan> {
    let start = tokens.iter().map(|token| token.start_line).min()?;
    let end = tokens.iter().map(|token| token.end_line).max()?;
    Some(SourceSpan::new(start, end))
}

/// Flat collection of all artifacts of one parse session.
#[derive(Debug, Clone, Default)]
pub struct ArtifactGraph {
    artifacts: Vec<Artifact>,
    namespaces: Vec<NodeId>,
    units: Vec<NodeId>,
    namespace_names: HashMap<String, NodeId>,
    keys: HashMap<String, NodeId>,
}

/// Construction and ownership methods used by the parser.
impl ArtifactGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file and its full token stream
    pub fn add_compilation_unit(&mut self, path: impl Into<String>, tokens: Vec<Token>) -> NodeId {
        let path = path.into();
        let span = token_extent(&tokens)
            .map(|extent| SourceSpan::new(1, extent.end_line))
            .unwrap_or_default();
        let meta = self.make_meta(
            ArtifactKind::CompilationUnit,
            path.clone(),
            path,
            None,
            span,
            tokens,
        );
        let id = self.push(Artifact::CompilationUnit(CompilationUnit {
            meta,
            declarations: Vec::new(),
        }));
        self.units.push(id);
        id
    }

    /// Get or create the namespace with the given name
    pub fn namespace(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        if let Some(&id) = self.namespace_names.get(&name) {
            return id;
        }
        let meta = self.make_meta(
            ArtifactKind::Namespace,
            name.clone(),
            name.clone(),
            None,
            SourceSpan::default(),
            Vec::new(),
        );
        let id = self.push(Artifact::Namespace(Namespace {
            meta,
            types: Vec::new(),
            functions: Vec::new(),
        }));
        self.namespaces.push(id);
        self.namespace_names.insert(name, id);
        id
    }

    pub fn add_class(&mut self, namespace: NodeId, declaration: Declaration) -> Result<NodeId> {
        self.add_type(namespace, ArtifactKind::Class, declaration)
    }

    pub fn add_interface(&mut self, namespace: NodeId, declaration: Declaration) -> Result<NodeId> {
        self.add_type(namespace, ArtifactKind::Interface, declaration)
    }

    pub fn add_trait(&mut self, namespace: NodeId, declaration: Declaration) -> Result<NodeId> {
        self.add_type(namespace, ArtifactKind::Trait, declaration)
    }

    fn add_type(
        &mut self,
        namespace: NodeId,
        kind: ArtifactKind,
        declaration: Declaration,
    ) -> Result<NodeId> {
        let namespace_name = self.require_namespace(namespace)?.meta.name.clone();
        let qualified_name = qualify(&namespace_name, &declaration.name);
        let span = declaration.resolved_span();
        let unit = declaration.unit;
        let meta = self.make_meta(kind, declaration.name, qualified_name, unit, span, declaration.tokens);
        let decl = TypeDecl {
            meta,
            namespace: None,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            is_abstract: kind == ArtifactKind::Interface,
            user_defined: true,
        };
        let artifact = match kind {
            ArtifactKind::Interface => Artifact::Interface(decl),
            ArtifactKind::Trait => Artifact::Trait(decl),
            _ => Artifact::Class(decl),
        };
        let id = self.push(artifact);
        self.attach_type(id, namespace)?;
        self.register_declaration(unit, id);
        Ok(id)
    }

    /// Add a method to a type
    pub fn add_method(&mut self, owner: NodeId, declaration: Declaration) -> Result<NodeId> {
        let owner_decl = self.require_type(owner)?;
        let qualified_name = format!("{}::{}", owner_decl.meta.qualified_name, declaration.name);
        let unit = declaration.unit.or(owner_decl.meta.unit);
        let span = declaration.resolved_span();
        let meta = self.make_meta(
            ArtifactKind::Method,
            declaration.name,
            qualified_name,
            unit,
            span,
            declaration.tokens,
        );
        let id = self.push(Artifact::Method(empty_callable(meta)));
        self.attach_method(id, owner)?;
        Ok(id)
    }

    /// Add a free function to a namespace
    pub fn add_function(&mut self, namespace: NodeId, declaration: Declaration) -> Result<NodeId> {
        let namespace_name = self.require_namespace(namespace)?.meta.name.clone();
        let qualified_name = qualify(&namespace_name, &declaration.name);
        let unit = declaration.unit;
        let span = declaration.resolved_span();
        let meta = self.make_meta(
            ArtifactKind::Function,
            declaration.name,
            qualified_name,
            unit,
            span,
            declaration.tokens,
        );
        let id = self.push(Artifact::Function(empty_callable(meta)));
        self.attach_function(id, namespace)?;
        self.register_declaration(unit, id);
        Ok(id)
    }

    /// Add a property to a type
    pub fn add_property(&mut self, owner: NodeId, declaration: Declaration) -> Result<NodeId> {
        let owner_decl = self.require_type(owner)?;
        let qualified_name = format!("{}::{}", owner_decl.meta.qualified_name, declaration.name);
        let unit = declaration.unit.or(owner_decl.meta.unit);
        let span = declaration.resolved_span();
        let meta = self.make_meta(
            ArtifactKind::Property,
            declaration.name,
            qualified_name,
            unit,
            span,
            declaration.tokens,
        );
        let id = self.push(Artifact::Property(Property {
            meta,
            owner: None,
            type_ref: None,
            visibility: Visibility::default(),
            is_static: false,
        }));
        self.attach_property(id, owner)?;
        Ok(id)
    }

    /// Move a type into `namespace`, detaching it from its previous owner first
    pub fn attach_type(&mut self, type_id: NodeId, namespace: NodeId) -> Result<()> {
        self.require_namespace(namespace)?;
        let previous = self.require_type(type_id)?.namespace;
        if previous == Some(namespace) {
            return Ok(());
        }
        if let Some(previous) = previous {
            if let Some(old) = self.namespace_mut(previous) {
                old.types.retain(|&id| id != type_id);
            }
        }
        if let Some(decl) = self.type_mut(type_id) {
            decl.namespace = Some(namespace);
        }
        if let Some(owner) = self.namespace_mut(namespace) {
            owner.types.push(type_id);
        }
        Ok(())
    }

    /// Move a method onto `owner`, detaching it from its previous type first
    pub fn attach_method(&mut self, method: NodeId, owner: NodeId) -> Result<()> {
        self.require_type(owner)?;
        let previous = match self.get(method) {
            Some(Artifact::Method(callable)) => callable.owner,
            _ => return Err(not_a(method, "method")),
        };
        if previous == Some(owner) {
            return Ok(());
        }
        if let Some(previous) = previous {
            if let Some(old) = self.type_mut(previous) {
                old.methods.retain(|&id| id != method);
            }
        }
        if let Some(callable) = self.callable_mut(method) {
            callable.owner = Some(owner);
        }
        if let Some(decl) = self.type_mut(owner) {
            decl.methods.push(method);
        }
        Ok(())
    }

    /// Move a function into `namespace`, detaching it from its previous owner first
    pub fn attach_function(&mut self, function: NodeId, namespace: NodeId) -> Result<()> {
        self.require_namespace(namespace)?;
        let previous = match self.get(function) {
            Some(Artifact::Function(callable)) => callable.owner,
            _ => return Err(not_a(function, "function")),
        };
        if previous == Some(namespace) {
            return Ok(());
        }
        if let Some(previous) = previous {
            if let Some(old) = self.namespace_mut(previous) {
                old.functions.retain(|&id| id != function);
            }
        }
        if let Some(callable) = self.callable_mut(function) {
            callable.owner = Some(namespace);
        }
        if let Some(owner) = self.namespace_mut(namespace) {
            owner.functions.push(function);
        }
        Ok(())
    }

    /// Move a property onto `owner`, detaching it from its previous type first
    pub fn attach_property(&mut self, property: NodeId, owner: NodeId) -> Result<()> {
        self.require_type(owner)?;
        let previous = self
            .property(property)
            .ok_or_else(|| not_a(property, "property"))?
            .owner;
        if previous == Some(owner) {
            return Ok(());
        }
        if let Some(previous) = previous {
            if let Some(old) = self.type_mut(previous) {
                old.properties.retain(|&id| id != property);
            }
        }
        if let Some(Artifact::Property(prop)) = self.artifacts.get_mut(property.index()) {
            prop.owner = Some(owner);
        }
        if let Some(decl) = self.type_mut(owner) {
            decl.properties.push(property);
        }
        Ok(())
    }

    pub fn set_parent(&mut self, type_id: NodeId, parent: NodeId) -> Result<()> {
        self.require_type(parent)?;
        self.type_mut(type_id)
            .ok_or_else(|| not_a(type_id, "type"))?
            .parent = Some(parent);
        Ok(())
    }

    pub fn add_implemented_interface(&mut self, type_id: NodeId, interface: NodeId) -> Result<()> {
        self.require_type(interface)?;
        let decl = self.type_mut(type_id).ok_or_else(|| not_a(type_id, "type"))?;
        if !decl.interfaces.contains(&interface) {
            decl.interfaces.push(interface);
        }
        Ok(())
    }

    pub fn use_trait(&mut self, type_id: NodeId, used: NodeId) -> Result<()> {
        self.require_type(used)?;
        let decl = self.type_mut(type_id).ok_or_else(|| not_a(type_id, "type"))?;
        if !decl.traits.contains(&used) {
            decl.traits.push(used);
        }
        Ok(())
    }

    pub fn set_abstract(&mut self, id: NodeId, is_abstract: bool) -> Result<()> {
        if let Some(decl) = self.type_mut(id) {
            decl.is_abstract = is_abstract;
            return Ok(());
        }
        self.callable_mut(id)
            .ok_or_else(|| not_a(id, "type or callable"))?
            .is_abstract = is_abstract;
        Ok(())
    }

    /// Mark a type as a library type known only by reference
    pub fn set_user_defined(&mut self, type_id: NodeId, user_defined: bool) -> Result<()> {
        self.type_mut(type_id)
            .ok_or_else(|| not_a(type_id, "type"))?
            .user_defined = user_defined;
        Ok(())
    }

    /// Record a type reference from a callable
    pub fn add_dependency(
        &mut self,
        callable: NodeId,
        target: NodeId,
        kind: DependencyKind,
    ) -> Result<()> {
        self.require_type(target)?;
        self.callable_mut(callable)
            .ok_or_else(|| not_a(callable, "callable"))?
            .dependencies
            .push(Dependency { target, kind });
        Ok(())
    }

    pub fn add_call(&mut self, callable: NodeId, call: CallSite) -> Result<()> {
        self.callable_mut(callable)
            .ok_or_else(|| not_a(callable, "callable"))?
            .calls
            .push(call);
        Ok(())
    }

    pub fn set_property_type(&mut self, property: NodeId, type_ref: NodeId) -> Result<()> {
        self.require_type(type_ref)?;
        match self.artifacts.get_mut(property.index()) {
            Some(Artifact::Property(prop)) => {
                prop.type_ref = Some(type_ref);
                Ok(())
            }
            _ => Err(not_a(property, "property")),
        }
    }

    pub fn set_visibility(&mut self, member: NodeId, visibility: Visibility) -> Result<()> {
        match self.artifacts.get_mut(member.index()) {
            Some(Artifact::Method(callable)) => callable.visibility = visibility,
            Some(Artifact::Property(prop)) => prop.visibility = visibility,
            _ => return Err(not_a(member, "method or property")),
        }
        Ok(())
    }

    pub fn set_static(&mut self, member: NodeId, is_static: bool) -> Result<()> {
        match self.artifacts.get_mut(member.index()) {
            Some(Artifact::Method(callable)) => callable.is_static = is_static,
            Some(Artifact::Property(prop)) => prop.is_static = is_static,
            _ => return Err(not_a(member, "method or property")),
        }
        Ok(())
    }

    /// Flag an artifact as unchanged since the previous run
    pub fn set_cached(&mut self, id: NodeId, cached: bool) -> Result<()> {
        self.artifacts
            .get_mut(id.index())
            .ok_or_else(|| unknown(id))?
            .meta_mut()
            .cached = cached;
        Ok(())
    }

    fn make_meta(
        &mut self,
        kind: ArtifactKind,
        name: String,
        qualified_name: String,
        unit: Option<NodeId>,
        span: SourceSpan,
        tokens: Vec<Token>,
    ) -> ArtifactMeta {
        let unit_name = unit
            .and_then(|unit| self.get(unit))
            .map(|artifact| artifact.meta().name.clone())
            .unwrap_or_default();
        let key = self.unique_key(kind, &unit_name, &qualified_name, span.start_line);
        let fingerprint = fingerprint_tokens(&tokens);
        ArtifactMeta {
            id: NodeId(self.artifacts.len() as u32),
            key,
            name,
            qualified_name,
            kind,
            span,
            tokens,
            fingerprint,
            cached: false,
            unit,
        }
    }

    fn unique_key(
        &self,
        kind: ArtifactKind,
        unit_name: &str,
        qualified_name: &str,
        start_line: u32,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.label().as_bytes());
        hasher.update([0u8]);
        hasher.update(unit_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(qualified_name.as_bytes());
        hasher.update(start_line.to_be_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let base = digest[..KEY_LENGTH].to_string();

        let mut candidate = base.clone();
        let mut suffix = 0;
        while self.keys.contains_key(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
        candidate
    }

    fn push(&mut self, artifact: Artifact) -> NodeId {
        let id = artifact.meta().id;
        self.keys.insert(artifact.meta().key.clone(), id);
        self.artifacts.push(artifact);
        id
    }

    fn register_declaration(&mut self, unit: Option<NodeId>, id: NodeId) {
        let Some(unit) = unit else {
            return;
        };
        if let Some(Artifact::CompilationUnit(file)) = self.artifacts.get_mut(unit.index()) {
            file.declarations.push(id);
        }
    }

    fn require_namespace(&self, id: NodeId) -> Result<&Namespace> {
        self.namespace_node(id).ok_or_else(|| not_a(id, "namespace"))
    }

    fn require_type(&self, id: NodeId) -> Result<&TypeDecl> {
        self.type_decl(id).ok_or_else(|| not_a(id, "type"))
    }

    fn namespace_mut(&mut self, id: NodeId) -> Option<&mut Namespace> {
        match self.artifacts.get_mut(id.index()) {
            Some(Artifact::Namespace(namespace)) => Some(namespace),
            _ => None,
        }
    }

    fn type_mut(&mut self, id: NodeId) -> Option<&mut TypeDecl> {
        match self.artifacts.get_mut(id.index()) {
            Some(Artifact::Class(decl) | Artifact::Interface(decl) | Artifact::Trait(decl)) => {
                Some(decl)
            }
            _ => None,
        }
    }

    fn callable_mut(&mut self, id: NodeId) -> Option<&mut Callable> {
        match self.artifacts.get_mut(id.index()) {
            Some(Artifact::Function(callable) | Artifact::Method(callable)) => Some(callable),
            _ => None,
        }
    }
}

/// Read-only queries used by the analyzers.
impl ArtifactGraph {
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Artifact> {
        self.artifacts.get(id.index())
    }

    pub fn meta(&self, id: NodeId) -> Option<&ArtifactMeta> {
        self.get(id).map(Artifact::meta)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    /// Namespace ids in creation order
    pub fn namespace_ids(&self) -> &[NodeId] {
        &self.namespaces
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces
            .iter()
            .filter_map(move |&id| self.namespace_node(id))
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.iter().filter_map(move |&id| self.unit(id))
    }

    pub fn namespace_node(&self, id: NodeId) -> Option<&Namespace> {
        self.get(id).and_then(Artifact::as_namespace)
    }

    pub fn type_decl(&self, id: NodeId) -> Option<&TypeDecl> {
        self.get(id).and_then(Artifact::as_type)
    }

    pub fn callable(&self, id: NodeId) -> Option<&Callable> {
        self.get(id).and_then(Artifact::as_callable)
    }

    pub fn property(&self, id: NodeId) -> Option<&Property> {
        self.get(id).and_then(Artifact::as_property)
    }

    pub fn unit(&self, id: NodeId) -> Option<&CompilationUnit> {
        self.get(id).and_then(Artifact::as_unit)
    }

    pub fn find_by_key(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    pub fn namespace_by_name(&self, name: &str) -> Option<NodeId> {
        self.namespace_names.get(name).copied()
    }

    /// Parent classes from the direct parent upwards; stops on inheritance loops
    pub fn parent_chain(&self, type_id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([type_id]);
        let mut current = self.type_decl(type_id).and_then(|decl| decl.parent);
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.type_decl(parent).and_then(|decl| decl.parent);
        }
        chain
    }

    /// Every transitive supertype (classes, interfaces, traits), nearest first
    pub fn ancestors(&self, type_id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([type_id]);
        let mut queue: VecDeque<NodeId> = self
            .type_decl(type_id)
            .map(|decl| decl.supertypes().collect())
            .unwrap_or_default();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            result.push(next);
            if let Some(decl) = self.type_decl(next) {
                queue.extend(decl.supertypes());
            }
        }
        result
    }

    /// Whether `candidate` is `ancestor` itself or derives from it
    pub fn is_subtype_of(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        candidate == ancestor || self.ancestors(candidate).contains(&ancestor)
    }

    /// Type declaring a method or property
    pub fn declaring_type(&self, member: NodeId) -> Option<NodeId> {
        match self.get(member)? {
            Artifact::Method(callable) => callable.owner,
            Artifact::Property(property) => property.owner,
            _ => None,
        }
    }

    /// Namespace an artifact belongs to, following ownership upwards
    pub fn namespace_of(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id)? {
            Artifact::Namespace(_) => Some(id),
            Artifact::Class(decl) | Artifact::Interface(decl) | Artifact::Trait(decl) => {
                decl.namespace
            }
            Artifact::Function(callable) => callable.owner,
            Artifact::Method(callable) => callable.owner.and_then(|owner| self.namespace_of(owner)),
            Artifact::Property(property) => {
                property.owner.and_then(|owner| self.namespace_of(owner))
            }
            Artifact::CompilationUnit(_) => None,
        }
    }
}

fn empty_callable(meta: ArtifactMeta) -> Callable {
    Callable {
        meta,
        owner: None,
        dependencies: Vec::new(),
        calls: Vec::new(),
        visibility: Visibility::default(),
        is_abstract: false,
        is_static: false,
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}\\{}", namespace, name)
    }
}

fn not_a(id: NodeId, expected: &str) -> MetricsError {
    MetricsError::graph(format!("artifact {} is not a {}", id, expected)).with_context(id.to_string())
}

fn unknown(id: NodeId) -> MetricsError {
    MetricsError::graph(format!("unknown artifact {}", id)).with_context(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::TokenKind;

    fn sample() -> (ArtifactGraph, NodeId, NodeId) {
        let mut graph = ArtifactGraph::new();
        let app = graph.namespace("app");
        let lib = graph.namespace("lib");
        (graph, app, lib)
    }

    #[test]
    fn namespaces_are_deduplicated_by_name() {
        let (mut graph, app, _) = sample();
        assert_eq!(graph.namespace("app"), app);
        assert_eq!(graph.namespace_ids().len(), 2);
    }

    #[test]
    fn qualified_names_follow_ownership() {
        let (mut graph, app, _) = sample();
        let class = graph.add_class(app, Declaration::new("Service")).unwrap();
        let method = graph.add_method(class, Declaration::new("run")).unwrap();

        assert_eq!(graph.meta(class).unwrap().qualified_name, "app\\Service");
        assert_eq!(graph.meta(method).unwrap().qualified_name, "app\\Service::run");
        assert_eq!(graph.namespace_of(method), Some(app));
        assert_eq!(graph.declaring_type(method), Some(class));
    }

    #[test]
    fn moving_a_type_removes_it_from_the_old_namespace() {
        let (mut graph, app, lib) = sample();
        let class = graph.add_class(app, Declaration::new("Service")).unwrap();

        graph.attach_type(class, lib).unwrap();

        assert!(graph.namespace_node(app).unwrap().types.is_empty());
        assert_eq!(graph.namespace_node(lib).unwrap().types, vec![class]);
        assert_eq!(graph.type_decl(class).unwrap().namespace, Some(lib));
    }

    #[test]
    fn moving_a_method_never_duplicates_ownership() {
        let (mut graph, app, _) = sample();
        let first = graph.add_class(app, Declaration::new("First")).unwrap();
        let second = graph.add_class(app, Declaration::new("Second")).unwrap();
        let method = graph.add_method(first, Declaration::new("run")).unwrap();

        graph.attach_method(method, second).unwrap();
        graph.attach_method(method, second).unwrap();

        assert!(graph.type_decl(first).unwrap().methods.is_empty());
        assert_eq!(graph.type_decl(second).unwrap().methods, vec![method]);
    }

    #[test]
    fn keys_are_unique_and_stable() {
        let build = || {
            let mut graph = ArtifactGraph::new();
            let app = graph.namespace("app");
            let a = graph.add_class(app, Declaration::new("A").lines(3, 9)).unwrap();
            let b = graph.add_class(app, Declaration::new("A").lines(3, 9)).unwrap();
            (graph, a, b)
        };
        let (first, a1, b1) = build();
        let (second, a2, b2) = build();

        assert_ne!(first.meta(a1).unwrap().key, first.meta(b1).unwrap().key);
        assert_eq!(first.meta(a1).unwrap().key, second.meta(a2).unwrap().key);
        assert_eq!(first.meta(b1).unwrap().key, second.meta(b2).unwrap().key);
        assert_eq!(first.find_by_key(&first.meta(b1).unwrap().key), Some(b1));
    }

    #[test]
    fn subtype_queries_are_transitive_and_reflexive() {
        let (mut graph, app, _) = sample();
        let base = graph.add_interface(app, Declaration::new("Base")).unwrap();
        let middle = graph.add_class(app, Declaration::new("Middle")).unwrap();
        let leaf = graph.add_class(app, Declaration::new("Leaf")).unwrap();
        graph.add_implemented_interface(middle, base).unwrap();
        graph.set_parent(leaf, middle).unwrap();

        assert!(graph.is_subtype_of(leaf, leaf));
        assert!(graph.is_subtype_of(leaf, middle));
        assert!(graph.is_subtype_of(leaf, base));
        assert!(!graph.is_subtype_of(base, leaf));
        assert_eq!(graph.parent_chain(leaf), vec![middle]);
    }

    #[test]
    fn inheritance_loops_do_not_hang() {
        let (mut graph, app, _) = sample();
        let a = graph.add_class(app, Declaration::new("A")).unwrap();
        let b = graph.add_class(app, Declaration::new("B")).unwrap();
        graph.set_parent(a, b).unwrap();
        graph.set_parent(b, a).unwrap();

        assert_eq!(graph.parent_chain(a), vec![b]);
        assert_eq!(graph.ancestors(a), vec![b]);
    }

    #[test]
    fn span_defaults_to_token_extent() {
        let (mut graph, app, _) = sample();
        let tokens = vec![
            Token::new(TokenKind::Function, "function", 4),
            Token::new(TokenKind::CurlyBraceClose, "}", 8),
        ];
        let function = graph
            .add_function(app, Declaration::new("helper").with_tokens(tokens))
            .unwrap();
        assert_eq!(graph.meta(function).unwrap().span, SourceSpan::new(4, 8));
    }

    #[test]
    fn declarations_are_recorded_on_their_unit() {
        let (mut graph, app, _) = sample();
        let unit = graph.add_compilation_unit("src/A.php", Vec::new());
        let class = graph.add_class(app, Declaration::new("A").in_unit(unit)).unwrap();
        let method = graph.add_method(class, Declaration::new("run")).unwrap();

        assert_eq!(graph.unit(unit).unwrap().declarations, vec![class]);
        assert_eq!(graph.meta(method).unwrap().unit, Some(unit));
    }

    #[test]
    fn wrong_kind_is_reported_as_graph_error() {
        let (mut graph, app, _) = sample();
        let err = graph.add_method(app, Declaration::new("run")).unwrap_err();
        assert!(matches!(err, MetricsError::Graph { .. }));
    }
}
