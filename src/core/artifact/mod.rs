//! The artifact graph: namespaces, types, callables and properties parsed
//! from source, stored in a flat arena and linked by [`NodeId`] edges.
//!
//! The graph is populated by an external parser through the mutation API on
//! [`ArtifactGraph`] and is read-only for every analyzer.

pub mod fingerprint;
pub mod graph;
pub mod tokens;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use fingerprint::{fingerprint_tokens, FingerprintIndex};
pub use graph::{ArtifactGraph, Declaration};
pub use tokens::{Token, TokenKind};

/// Arena index of an artifact inside one [`ArtifactGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the artifact in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Artifact categories known to the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    CompilationUnit,
    Namespace,
    Class,
    Interface,
    Trait,
    Function,
    Method,
    Property,
}

impl ArtifactKind {
    /// Lower-case label used in keys and log output
    pub fn label(self) -> &'static str {
        match self {
            Self::CompilationUnit => "file",
            Self::Namespace => "namespace",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Function => "function",
            Self::Method => "method",
            Self::Property => "property",
        }
    }

    /// Whether this kind is one of the type declarations
    pub fn is_type(self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Trait)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Inclusive line range of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub end_line: u32,
}

impl SourceSpan {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// Number of physical lines covered; zero for an unset span
    pub fn line_count(&self) -> u32 {
        if self.start_line == 0 && self.end_line == 0 {
            0
        } else {
            self.end_line - self.start_line + 1
        }
    }
}

/// Attributes every artifact carries regardless of its kind
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactMeta {
    /// Arena position
    pub id: NodeId,

    /// Stable identity used for metrics tables and cache entries
    pub key: String,

    /// Simple name
    pub name: String,

    /// Fully qualified name (`ns\Type::member`)
    pub qualified_name: String,

    pub kind: ArtifactKind,

    pub span: SourceSpan,

    /// Raw tokens of the declaration
    pub tokens: Vec<Token>,

    /// Hash of the token stream
    pub fingerprint: String,

    /// Set when the artifact is unchanged since the previous run
    pub cached: bool,

    /// Compilation unit that declares this artifact
    pub unit: Option<NodeId>,
}

impl ArtifactMeta {
    pub fn is_cached(&self) -> bool {
        self.cached
    }
}

/// What a type reference from a callable is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    Parameter,
    Return,
    Throws,
    LocalVariable,
    Invocation,
    Allocation,
    StaticReference,
}

/// Directed reference from a callable to a type it uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub target: NodeId,
    pub kind: DependencyKind,
}

/// One invocation expression inside a callable body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// Receiver chain as written (`$this->logger`, `Factory`), if any
    pub receiver: Option<String>,

    /// Invoked member or function name
    pub name: String,
}

impl CallSite {
    pub fn new(receiver: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            receiver: receiver.map(str::to_string),
            name: name.into(),
        }
    }

    /// Receiver-qualified image used to de-duplicate identical calls
    pub fn signature(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{}.{}()", receiver, self.name),
            None => format!("{}()", self.name),
        }
    }
}

/// A source file
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub meta: ArtifactMeta,

    /// Types and functions declared in the file, in declaration order
    pub declarations: Vec<NodeId>,
}

/// A namespace / logical package
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub meta: ArtifactMeta,

    /// Owned types in declaration order
    pub types: Vec<NodeId>,

    /// Owned free functions in declaration order
    pub functions: Vec<NodeId>,
}

/// Class, interface or trait declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub meta: ArtifactMeta,

    /// Owning namespace
    pub namespace: Option<NodeId>,

    /// Direct superclass
    pub parent: Option<NodeId>,

    /// Implemented (classes) or extended (interfaces) interfaces
    pub interfaces: Vec<NodeId>,

    /// Used traits
    pub traits: Vec<NodeId>,

    pub methods: Vec<NodeId>,

    pub properties: Vec<NodeId>,

    pub is_abstract: bool,

    /// False for library types the parser only knows by reference
    pub user_defined: bool,
}

impl TypeDecl {
    /// Direct supertypes: parent class first, then interfaces and traits
    pub fn supertypes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parent
            .iter()
            .copied()
            .chain(self.interfaces.iter().copied())
            .chain(self.traits.iter().copied())
    }
}

/// Function or method
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    pub meta: ArtifactMeta,

    /// Declaring type for methods, namespace for functions
    pub owner: Option<NodeId>,

    /// Every type reference found in signature and body
    pub dependencies: Vec<Dependency>,

    /// Invocation expressions in the body
    pub calls: Vec<CallSite>,

    pub visibility: Visibility,

    pub is_abstract: bool,

    pub is_static: bool,
}

impl Callable {
    /// Declared return type
    pub fn return_type(&self) -> Option<NodeId> {
        self.dependencies_of(DependencyKind::Return).next()
    }

    /// Declared thrown exception types
    pub fn exceptions(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.dependencies_of(DependencyKind::Throws)
    }

    /// Types of typed parameters
    pub fn parameter_types(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.dependencies_of(DependencyKind::Parameter)
    }

    /// Targets of a single dependency kind
    pub fn dependencies_of(&self, kind: DependencyKind) -> impl Iterator<Item = NodeId> + '_ {
        self.dependencies
            .iter()
            .filter(move |dependency| dependency.kind == kind)
            .map(|dependency| dependency.target)
    }
}

/// Class/trait property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub meta: ArtifactMeta,

    /// Declaring type
    pub owner: Option<NodeId>,

    /// Declared or documented field type
    pub type_ref: Option<NodeId>,

    pub visibility: Visibility,

    pub is_static: bool,
}

/// Closed set of artifact variants stored in the arena
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    CompilationUnit(CompilationUnit),
    Namespace(Namespace),
    Class(TypeDecl),
    Interface(TypeDecl),
    Trait(TypeDecl),
    Function(Callable),
    Method(Callable),
    Property(Property),
}

impl Artifact {
    pub fn meta(&self) -> &ArtifactMeta {
        match self {
            Self::CompilationUnit(unit) => &unit.meta,
            Self::Namespace(namespace) => &namespace.meta,
            Self::Class(decl) | Self::Interface(decl) | Self::Trait(decl) => &decl.meta,
            Self::Function(callable) | Self::Method(callable) => &callable.meta,
            Self::Property(property) => &property.meta,
        }
    }

    pub(crate) fn meta_mut(&mut self) -> &mut ArtifactMeta {
        match self {
            Self::CompilationUnit(unit) => &mut unit.meta,
            Self::Namespace(namespace) => &mut namespace.meta,
            Self::Class(decl) | Self::Interface(decl) | Self::Trait(decl) => &mut decl.meta,
            Self::Function(callable) | Self::Method(callable) => &mut callable.meta,
            Self::Property(property) => &mut property.meta,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.meta().kind
    }

    pub fn as_type(&self) -> Option<&TypeDecl> {
        match self {
            Self::Class(decl) | Self::Interface(decl) | Self::Trait(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(callable) | Self::Method(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Self::Property(property) => Some(property),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&CompilationUnit> {
        match self {
            Self::CompilationUnit(unit) => Some(unit),
            _ => None,
        }
    }
}
