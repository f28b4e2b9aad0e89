mod name;
mod spec;

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::Type;

use crate::binding::{BindingRequest, Key, RequestKind};

pub use name::UniqueNameSet;
pub use spec::{FieldSpec, MethodSpec, TypeSpec};

pub(crate) use name::variable_name;

/// Handle to one shard in a component implementation's arena.
///
/// Cross-unit references are index-based: a representation remembers the
/// handle of its owning shard, never a pointer into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShardId(usize);

/// A kind of field a generated unit can contain. Members are emitted grouped
/// by kind in declaration order, insertion order within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// The root's field holding one of its shards.
    ComponentShardField,
    /// A shard's back-reference to the component.
    ComponentField,
    /// A provider field for a binding.
    FrameworkField,
}

/// A kind of method a generated unit can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MethodKind {
    /// An implementation of a method on the component's public surface.
    ComponentMethod,
    /// A private accessor wrapping a dependency expression.
    PrivateMethod,
    /// A private method encapsulating members-injection logic for a binding.
    MembersInjectionMethod,
    /// A method initializing framework fields.
    Initialize,
}

/// A kind of nested type a generated unit can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKind {
    /// A provider factory type for a binding.
    ProviderFactory,
    /// A shard of the component.
    ComponentShard,
}

type TypeSupplier = Box<dyn FnOnce() -> TypeSpec>;

struct Shard {
    name: String,
    /// Field on the root unit through which siblings reach this shard.
    /// Installed on first foreign access.
    back_reference: Option<String>,
    fields: BTreeMap<FieldKind, Vec<FieldSpec>>,
    methods: BTreeMap<MethodKind, Vec<MethodSpec>>,
    types: BTreeMap<TypeKind, Vec<TypeSpec>>,
    type_suppliers: Vec<TypeSupplier>,
    initializations: Vec<TokenStream>,
    bindings: usize,
    sealed: bool,
}

impl Shard {
    fn new(name: String) -> Self {
        Self {
            name,
            back_reference: None,
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
            types: BTreeMap::new(),
            type_suppliers: Vec::new(),
            initializations: Vec::new(),
            bindings: 0,
            sealed: false,
        }
    }
}

/// The accumulator and partitioning authority for one logical component.
///
/// The root shard is the component itself; further shards are opened whenever
/// the open shard would exceed the configured binding ceiling, and assembled
/// as nested units of the root. All member collections are write-once within
/// a single generation pass, and [`ComponentImplementation::generate`]
/// consumes the implementation so that nothing can be added afterwards.
pub struct ComponentImplementation {
    shards: Vec<Shard>,
    open_shard: usize,
    bindings_per_shard: NonZeroUsize,
    shards_by_binding: HashMap<Key, ShardId>,
    field_names: UniqueNameSet,
    method_names: UniqueNameSet,
    type_names: UniqueNameSet,
}

impl ComponentImplementation {
    /// The root shard: the unit representing the component itself.
    pub const COMPONENT_SHARD: ShardId = ShardId(0);

    /// Name of the back-reference field every non-root shard holds.
    const COMPONENT_FIELD: &'static str = "component";

    /// `bindings_per_shard` is the partition ceiling, a policy decided by the
    /// caller rather than inferred here.
    pub fn new(name: &str, bindings_per_shard: NonZeroUsize) -> Self {
        let mut type_names = UniqueNameSet::new();
        let root_name = type_names.unique_name(name);
        // The back-reference field and the initializer carry fixed names on
        // every unit; nothing pooled may shadow them.
        let mut field_names = UniqueNameSet::new();
        field_names.claim(Self::COMPONENT_FIELD);
        let mut method_names = UniqueNameSet::new();
        method_names.claim("initialize");
        Self {
            shards: vec![Shard::new(root_name)],
            open_shard: 0,
            bindings_per_shard,
            shards_by_binding: HashMap::new(),
            field_names,
            method_names,
            type_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.shards[Self::COMPONENT_SHARD.0].name
    }

    pub fn shard_name(&self, shard: ShardId) -> &str {
        &self.shards[shard.0].name
    }

    /// Returns the shard a binding's members belong to, assigning one on
    /// first call. Assignment fills the open shard up to the ceiling, sealing
    /// it the moment the ceiling is reached; a sealed open shard makes the
    /// next assignment open a new one. Reaching the ceiling is expected
    /// control flow, not an error.
    pub fn shard_for_binding(&mut self, key: &Key) -> ShardId {
        if let Some(shard) = self.shards_by_binding.get(key) {
            return *shard;
        }

        if self.shards[self.open_shard].sealed {
            self.open_shard = self.create_shard();
        }
        let shard = ShardId(self.open_shard);
        self.shards[self.open_shard].bindings += 1;
        if self.shards[self.open_shard].bindings >= self.bindings_per_shard.get() {
            self.shards[self.open_shard].sealed = true;
        }
        self.shards_by_binding.insert(key.clone(), shard);
        shard
    }

    fn create_shard(&mut self) -> usize {
        let shard_name = self.type_names.unique_name(&format!("{}Shard", self.name()));
        let mut shard = Shard::new(shard_name);
        let root = Ident::new(self.name(), Span::call_site());
        shard
            .fields
            .entry(FieldKind::ComponentField)
            .or_default()
            .push(FieldSpec::new(
                Self::COMPONENT_FIELD,
                Type::Verbatim(quote!(std::rc::Rc<#root>)),
            ));
        self.shards.push(shard);
        self.shards.len() - 1
    }

    /// Returns the expression through which `requesting` reaches `owning`:
    /// `self` inside the owning unit, otherwise a path through the requesting
    /// unit's component back-reference and the root's shard field. The shard
    /// field is installed on the root the first time a foreign unit needs it.
    pub fn shard_field_reference(&mut self, requesting: ShardId, owning: ShardId) -> TokenStream {
        if requesting == owning {
            return quote!(self);
        }
        if owning == Self::COMPONENT_SHARD {
            let component = Ident::new(Self::COMPONENT_FIELD, Span::call_site());
            return quote!(self.#component);
        }

        let field = self.back_reference_field(owning);
        let field = Ident::new(&field, Span::call_site());
        if requesting == Self::COMPONENT_SHARD {
            quote!(self.#field)
        } else {
            let component = Ident::new(Self::COMPONENT_FIELD, Span::call_site());
            quote!(self.#component.#field)
        }
    }

    fn back_reference_field(&mut self, shard: ShardId) -> String {
        if let Some(field) = &self.shards[shard.0].back_reference {
            return field.clone();
        }

        let base = name::to_snake_case(&self.shards[shard.0].name);
        let field = self.field_names.unique_name(&base);
        let shard_ty = Ident::new(&self.shards[shard.0].name, Span::call_site());
        self.shards[Self::COMPONENT_SHARD.0]
            .fields
            .entry(FieldKind::ComponentShardField)
            .or_default()
            .push(FieldSpec::new(&field, Type::Verbatim(quote!(#shard_ty))));
        self.shards[shard.0].back_reference = Some(field.clone());
        field
    }

    pub fn add_field(&mut self, shard: ShardId, kind: FieldKind, field: FieldSpec) {
        self.shards[shard.0].fields.entry(kind).or_default().push(field);
    }

    pub fn add_method(&mut self, shard: ShardId, kind: MethodKind, method: MethodSpec) {
        self.shards[shard.0]
            .methods
            .entry(kind)
            .or_default()
            .push(method);
    }

    pub fn add_type(&mut self, shard: ShardId, kind: TypeKind, nested: TypeSpec) {
        self.shards[shard.0].types.entry(kind).or_default().push(nested);
    }

    /// Defers a nested type whose full definition depends on members not yet
    /// known. All suppliers run during [`ComponentImplementation::generate`],
    /// after every direct addition.
    pub fn add_type_supplier(&mut self, shard: ShardId, supplier: impl FnOnce() -> TypeSpec + 'static) {
        self.shards[shard.0].type_suppliers.push(Box::new(supplier));
    }

    /// Adds a statement to the shard's initialization method.
    pub fn add_initialization(&mut self, shard: ShardId, statement: TokenStream) {
        self.shards[shard.0].initializations.push(statement);
    }

    pub fn unique_field_name(&mut self, base: &str) -> String {
        self.field_names.unique_name(base)
    }

    pub fn unique_method_name(&mut self, base: &str) -> String {
        self.method_names.unique_name(base)
    }

    pub fn unique_type_name(&mut self, base: &str) -> String {
        self.type_names.unique_name(base)
    }

    /// Reserves a method name for the component's public surface. Does
    /// nothing if the name is already taken.
    pub fn claim_method_name(&mut self, name: &str) {
        self.method_names.claim(name);
    }

    /// Returns a fresh accessor name for a request, derived from the key and
    /// suffixed by the request kind where the kind is not `Instance`.
    pub fn unique_method_name_for_request(&mut self, request: &BindingRequest) -> String {
        let base = name::variable_name(request.key());
        let base = match request.kind() {
            RequestKind::Instance => base,
            RequestKind::Provider => format!("{base}_provider"),
            RequestKind::Lazy => format!("{base}_lazy"),
            RequestKind::MembersInjection => format!("inject_{base}"),
        };
        self.method_names.unique_name(&base)
    }

    /// Assembles the structural description of the whole shard tree.
    ///
    /// Non-root shards become nested types of the root, each unit's deferred
    /// type suppliers run after all direct additions, and members are emitted
    /// grouped by kind in insertion order, so identical input graphs produce
    /// identical output. Taking `self` by value freezes the implementation:
    /// nothing can be added once generation has started.
    pub fn generate(self) -> TypeSpec {
        let mut shards = self.shards;
        let mut root = shards.remove(0);
        for shard in shards {
            let assembled = Self::assemble(shard);
            root.types
                .entry(TypeKind::ComponentShard)
                .or_default()
                .push(assembled);
        }
        Self::assemble(root)
    }

    fn assemble(mut shard: Shard) -> TypeSpec {
        // Second phase: deferred types resolve only now, when every
        // cross-reference among direct members is known.
        let deferred: Vec<TypeSpec> = shard.type_suppliers.drain(..).map(|supply| supply()).collect();

        if !shard.initializations.is_empty() {
            let mut body = TokenStream::new();
            for statement in &shard.initializations {
                body.extend(statement.clone());
            }
            shard
                .methods
                .entry(MethodKind::Initialize)
                .or_default()
                .push(MethodSpec::initializer("initialize", body));
        }

        let mut assembled = TypeSpec::new(shard.name);
        for group in shard.fields.into_values() {
            for field in group {
                assembled.push_field(field);
            }
        }
        for group in shard.methods.into_values() {
            for method in group {
                assembled.push_method(method);
            }
        }
        for group in shard.types.into_values() {
            for nested in group {
                assembled.push_type(nested);
            }
        }
        for nested in deferred {
            assembled.push_type(nested);
        }
        assembled
    }

    #[cfg(test)]
    pub(crate) fn is_sealed(&self, shard: ShardId) -> bool {
        self.shards[shard.0].sealed
    }
}
