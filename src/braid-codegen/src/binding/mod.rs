use std::fmt::{Display, Formatter, Result as FmtResult};

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::Type;

/// Identifies the value a binding produces: its type plus an optional
/// qualifier distinguishing several bindings of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    ty: Type,
    qualifier: Option<String>,
}

impl Key {
    pub fn of(ty: Type) -> Self {
        Self {
            ty,
            qualifier: None,
        }
    }

    pub fn named(ty: Type, qualifier: impl Into<String>) -> Self {
        Self {
            ty,
            qualifier: Some(qualifier.into()),
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} named {:?}", self.ty.to_token_stream(), qualifier),
            None => write!(f, "{}", self.ty.to_token_stream()),
        }
    }
}

/// The caching policy attached to a binding.
///
/// A reusable scope permits best-effort caching: racing threads may construct
/// duplicates that are later discarded. A strict scope demands that at most
/// one instance is ever retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    reusable: bool,
}

impl Scope {
    pub fn reusable() -> Self {
        Self { reusable: true }
    }

    pub fn strict() -> Self {
        Self { reusable: false }
    }

    pub fn is_reusable(&self) -> bool {
        self.reusable
    }
}

/// The way a call site wants to consume a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// The value itself.
    Instance,
    /// A provider producing the value on demand.
    Provider,
    /// A lazily computed, then retained value.
    Lazy,
    /// Injection into the fields of an existing instance.
    MembersInjection,
}

impl RequestKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Provider => "provider",
            Self::Lazy => "lazy",
            Self::MembersInjection => "members-injection",
        }
    }
}

impl Display for RequestKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}

/// Distinguishes bindings that produce a value from bindings that inject the
/// fields of an instance the caller already owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Provision,
    MembersInjection,
}

/// A recipe for producing a value (or injecting an instance) for one [`Key`].
///
/// Bindings are created by the graph resolver and are read-only inputs here:
/// scope assignment, cycle breaking and dependency resolution have already
/// happened. `instantiation` carries the resolver-supplied raw construction
/// expression, or the injector target for members-injection bindings.
#[derive(Debug, Clone)]
pub struct Binding {
    key: Key,
    kind: BindingKind,
    scope: Option<Scope>,
    nullable: bool,
    dependencies: Vec<Key>,
    instantiation: TokenStream,
}

impl Binding {
    pub fn provision(key: Key, instantiation: TokenStream) -> Self {
        Self {
            key,
            kind: BindingKind::Provision,
            scope: None,
            nullable: false,
            dependencies: Vec::new(),
            instantiation,
        }
    }

    pub fn members_injection(key: Key, instantiation: TokenStream) -> Self {
        Self {
            key,
            kind: BindingKind::MembersInjection,
            scope: None,
            nullable: false,
            dependencies: Vec::new(),
            instantiation,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Key>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn dependencies(&self) -> &[Key] {
        &self.dependencies
    }

    pub fn instantiation(&self) -> &TokenStream {
        &self.instantiation
    }
}

/// One way a call site consumes one binding. Several requests may reference
/// the same binding with different kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingRequest {
    key: Key,
    kind: RequestKind,
}

impl BindingRequest {
    pub fn new(key: Key, kind: RequestKind) -> Self {
        Self { key, kind }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}
