use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;

use proc_macro2::{Ident, Span};
use quote::quote;
use syn::Type;

use crate::binding::{Binding, BindingRequest, RequestKind};
use crate::error::{CodegenError, IllegalRequestSnafu};
use crate::expr::{self, BindingInstanceSupplier, Expression, InstanceCreationExpression};
use crate::implementation::{
    variable_name, ComponentImplementation, FieldKind, FieldSpec, ShardId,
};
use crate::representation::{PrivateMethodRequestRepresentation, RequestRepresentation};

/// The strategy family for a provision binding.
///
/// Uncached instance requests take the direct tier, which inlines the value
/// expression behind a private method. Everything else goes through the
/// framework tier, which materializes the binding as a provider field;
/// whether caching is needed follows from the binding carrying a scope.
pub struct ProvisionBindingRepresentation {
    binding: Binding,
    needs_caching: bool,
    direct: DirectInstanceBindingRepresentation,
    framework: FrameworkInstanceBindingRepresentation,
}

impl ProvisionBindingRepresentation {
    pub fn new(binding: Binding, shard: ShardId) -> Self {
        Self {
            needs_caching: binding.scope().is_some(),
            direct: DirectInstanceBindingRepresentation::new(binding.clone(), shard),
            framework: FrameworkInstanceBindingRepresentation::new(binding.clone(), shard),
            binding,
        }
    }

    /// Returns the memoized representation for `request`, routing it to the
    /// direct or the framework tier.
    ///
    /// # Errors
    ///
    /// Fails on members-injection requests; a provision binding never
    /// satisfies those.
    pub fn request_representation(
        &mut self,
        request: &BindingRequest,
        cx: &mut ComponentImplementation,
    ) -> Result<Rc<dyn RequestRepresentation>, CodegenError> {
        match request.kind() {
            RequestKind::MembersInjection => IllegalRequestSnafu {
                key: self.binding.key().clone(),
                kind: request.kind(),
            }
            .fail(),
            RequestKind::Instance if !self.needs_caching => {
                self.direct.request_representation(request, cx)
            }
            _ => self.framework.request_representation(request, cx),
        }
    }
}

/// The direct tier: the value expression itself, wrapped in a private method
/// so that every call site shares one occurrence.
struct DirectInstanceBindingRepresentation {
    binding: Binding,
    shard: ShardId,
    representations: HashMap<RequestKind, Rc<dyn RequestRepresentation>>,
}

impl DirectInstanceBindingRepresentation {
    fn new(binding: Binding, shard: ShardId) -> Self {
        Self {
            binding,
            shard,
            representations: HashMap::new(),
        }
    }

    fn request_representation(
        &mut self,
        request: &BindingRequest,
        _cx: &mut ComponentImplementation,
    ) -> Result<Rc<dyn RequestRepresentation>, CodegenError> {
        if let Some(representation) = self.representations.get(&request.kind()) {
            return Ok(representation.clone());
        }

        let representation: Rc<dyn RequestRepresentation> = match request.kind() {
            RequestKind::Instance => Rc::new(PrivateMethodRequestRepresentation::new(
                request.clone(),
                self.shard,
                self.binding.key().ty().clone(),
                Rc::new(DirectInstanceRequestRepresentation {
                    binding: self.binding.clone(),
                }),
            )),
            _ => unreachable!("only uncached instance requests take the direct tier"),
        };
        self.representations
            .insert(request.kind(), representation.clone());
        Ok(representation)
    }
}

/// The resolver-supplied construction expression, verbatim.
struct DirectInstanceRequestRepresentation {
    binding: Binding,
}

impl RequestRepresentation for DirectInstanceRequestRepresentation {
    fn dependency_expression(
        &self,
        _requesting: ShardId,
        _cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        Ok(Expression::new(
            self.binding.key().ty().clone(),
            self.binding.instantiation().clone(),
        ))
    }
}

/// The framework tier: the binding materialized as a provider field on its
/// owning shard, with provider, lazy and cached-instance requests all derived
/// from that field.
struct FrameworkInstanceBindingRepresentation {
    binding: Binding,
    shard: ShardId,
    initializer: Rc<FrameworkFieldInitializer>,
    representations: HashMap<RequestKind, Rc<dyn RequestRepresentation>>,
}

impl FrameworkInstanceBindingRepresentation {
    fn new(binding: Binding, shard: ShardId) -> Self {
        Self {
            initializer: Rc::new(FrameworkFieldInitializer::new(binding.clone(), shard)),
            binding,
            shard,
            representations: HashMap::new(),
        }
    }

    fn request_representation(
        &mut self,
        request: &BindingRequest,
        _cx: &mut ComponentImplementation,
    ) -> Result<Rc<dyn RequestRepresentation>, CodegenError> {
        if let Some(representation) = self.representations.get(&request.kind()) {
            return Ok(representation.clone());
        }

        let representation: Rc<dyn RequestRepresentation> = match request.kind() {
            RequestKind::Provider => Rc::new(FrameworkInstanceRequestRepresentation {
                initializer: self.initializer.clone(),
                shard: self.shard,
            }),
            RequestKind::Instance | RequestKind::Lazy => {
                Rc::new(DerivedFromFrameworkInstanceRequestRepresentation {
                    initializer: self.initializer.clone(),
                    shard: self.shard,
                    kind: request.kind(),
                    instance_ty: self.binding.key().ty().clone(),
                })
            }
            RequestKind::MembersInjection => {
                unreachable!("members-injection requests never reach the framework tier")
            }
        };
        self.representations
            .insert(request.kind(), representation.clone());
        Ok(representation)
    }
}

/// Owns one provider field: its name, its type and its initialization
/// statement. The field is created once, on first use, no matter how many
/// request representations share the initializer.
struct FrameworkFieldInitializer {
    binding: Binding,
    shard: ShardId,
    field: OnceCell<(String, Type)>,
}

impl FrameworkFieldInitializer {
    fn new(binding: Binding, shard: ShardId) -> Self {
        Self {
            binding,
            shard,
            field: OnceCell::new(),
        }
    }

    fn get_or_create_field(
        &self,
        cx: &mut ComponentImplementation,
    ) -> Result<(String, Type), CodegenError> {
        if let Some(field) = self.field.get() {
            return Ok(field.clone());
        }

        let base = format!("{}_provider", variable_name(self.binding.key()));
        let name = cx.unique_field_name(&base);

        let creation = InstanceCreationExpression::new(
            Box::new(BindingInstanceSupplier::new(self.binding.clone())),
            self.binding.nullable(),
        );
        let unscoped = creation.creation_expression()?;
        let expression = if self.binding.scope().is_some() {
            expr::scope(&self.binding, unscoped)?
        } else {
            unscoped
        };

        // Fields hold their provider through a shared handle so that call
        // sites can take a copy by cloning.
        let inner_ty = expression.ty();
        let inner = expression.tokens();
        let field_ty = Type::Verbatim(quote!(braid::Shared<#inner_ty>));
        let ident = Ident::new(&name, Span::call_site());
        cx.add_field(
            self.shard,
            FieldKind::FrameworkField,
            FieldSpec::new(&name, field_ty.clone()),
        );
        cx.add_initialization(self.shard, quote!(self.#ident = braid::Shared::new(#inner);));

        let field = (name, field_ty);
        if self.field.set(field.clone()).is_err() {
            unreachable!("`field` is checked empty above");
        }
        Ok(field)
    }
}

/// A request for the provider itself: hands out the field.
struct FrameworkInstanceRequestRepresentation {
    initializer: Rc<FrameworkFieldInitializer>,
    shard: ShardId,
}

impl RequestRepresentation for FrameworkInstanceRequestRepresentation {
    fn dependency_expression(
        &self,
        requesting: ShardId,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        let (name, ty) = self.initializer.get_or_create_field(cx)?;
        let receiver = cx.shard_field_reference(requesting, self.shard);
        let field = Ident::new(&name, Span::call_site());
        Ok(Expression::new(ty, quote!(#receiver.#field.clone())))
    }
}

/// A request answered by adapting the provider field: `get` for an instance,
/// `lazy` for a lazy value.
struct DerivedFromFrameworkInstanceRequestRepresentation {
    initializer: Rc<FrameworkFieldInitializer>,
    shard: ShardId,
    kind: RequestKind,
    instance_ty: Type,
}

impl RequestRepresentation for DerivedFromFrameworkInstanceRequestRepresentation {
    fn dependency_expression(
        &self,
        requesting: ShardId,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        let (name, field_ty) = self.initializer.get_or_create_field(cx)?;
        let receiver = cx.shard_field_reference(requesting, self.shard);
        let field = Ident::new(&name, Span::call_site());
        match self.kind {
            RequestKind::Instance => Ok(Expression::new(
                self.instance_ty.clone(),
                quote!(#receiver.#field.get()),
            )),
            RequestKind::Lazy => Ok(Expression::new(
                Type::Verbatim(quote!(braid::Lazy<#field_ty>)),
                quote!(braid::Lazy::new(#receiver.#field.clone())),
            )),
            _ => unreachable!("only instance and lazy requests derive from the provider field"),
        }
    }
}

#[cfg(test)]
mod tests {
    use quote::ToTokens;
    use syn::parse_quote;

    use crate::binding::{Key, Scope};

    use super::*;

    fn implementation() -> ComponentImplementation {
        ComponentImplementation::new("AppComponent", std::num::NonZeroUsize::new(8).unwrap())
    }

    fn binding() -> Binding {
        Binding::provision(Key::of(parse_quote!(Database)), quote!(Database::connect()))
    }

    fn expression_for(
        representation: &mut ProvisionBindingRepresentation,
        kind: RequestKind,
        cx: &mut ComponentImplementation,
    ) -> Expression {
        let request = BindingRequest::new(Key::of(parse_quote!(Database)), kind);
        representation
            .request_representation(&request, cx)
            .unwrap()
            .dependency_expression(ComponentImplementation::COMPONENT_SHARD, cx)
            .unwrap()
    }

    #[test]
    fn uncached_instance_requests_inline_the_construction_behind_a_method() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation = ProvisionBindingRepresentation::new(binding(), shard);

        let expression = expression_for(&mut representation, RequestKind::Instance, &mut cx);
        assert_eq!(
            expression.tokens().to_string(),
            quote!(self.database()).to_string(),
        );

        let assembled = cx.generate();
        assert_eq!(assembled.fields().len(), 0);
        assert_eq!(
            assembled.methods()[0].body().to_string(),
            quote!(Database::connect()).to_string(),
        );
    }

    #[test]
    fn request_representations_are_memoized_per_kind() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation = ProvisionBindingRepresentation::new(binding(), shard);

        let request = BindingRequest::new(Key::of(parse_quote!(Database)), RequestKind::Instance);
        let first = representation.request_representation(&request, &mut cx).unwrap();
        let second = representation.request_representation(&request, &mut cx).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn provider_requests_materialize_one_initialized_field() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation =
            ProvisionBindingRepresentation::new(binding().with_scope(Scope::strict()), shard);

        let provider = expression_for(&mut representation, RequestKind::Provider, &mut cx);
        let lazy = expression_for(&mut representation, RequestKind::Lazy, &mut cx);
        assert_eq!(
            provider.tokens().to_string(),
            quote!(self.database_provider.clone()).to_string(),
        );
        assert_eq!(
            lazy.tokens().to_string(),
            quote!(braid::Lazy::new(self.database_provider.clone())).to_string(),
        );

        let assembled = cx.generate();
        assert_eq!(assembled.fields().len(), 1);
        assert_eq!(assembled.fields()[0].name(), "database_provider");
        assert_eq!(assembled.methods().len(), 1);
        assert_eq!(assembled.methods()[0].name(), "initialize");
    }

    #[test]
    fn strict_scopes_initialize_the_field_with_the_double_check_wrapper() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation =
            ProvisionBindingRepresentation::new(binding().with_scope(Scope::strict()), shard);

        expression_for(&mut representation, RequestKind::Provider, &mut cx);
        let assembled = cx.generate();
        let initialize = assembled.methods()[0].body().to_string();
        assert!(initialize.contains("DoubleCheck :: provider"));
        assert!(
            assembled.fields()[0]
                .ty()
                .to_token_stream()
                .to_string()
                .contains("DoubleCheck")
        );
    }

    #[test]
    fn reusable_scopes_initialize_the_field_with_the_single_check_wrapper() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation =
            ProvisionBindingRepresentation::new(binding().with_scope(Scope::reusable()), shard);

        expression_for(&mut representation, RequestKind::Instance, &mut cx);
        let assembled = cx.generate();
        let initialize = assembled.methods()[0].body().to_string();
        assert!(initialize.contains("SingleCheck :: provider"));
    }

    #[test]
    fn unscoped_provider_requests_skip_the_caching_wrapper() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation = ProvisionBindingRepresentation::new(binding(), shard);

        expression_for(&mut representation, RequestKind::Provider, &mut cx);
        let assembled = cx.generate();
        let initialize = assembled.methods()[0].body().to_string();
        assert!(initialize.contains("InstanceFactory :: create"));
        assert!(!initialize.contains("Check :: provider"));
    }

    #[test]
    fn nullable_bindings_use_the_nullable_factory_form() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let mut representation =
            ProvisionBindingRepresentation::new(binding().with_nullable(true), shard);

        expression_for(&mut representation, RequestKind::Provider, &mut cx);
        let assembled = cx.generate();
        let initialize = assembled.methods()[0].body().to_string();
        assert!(initialize.contains("create_nullable"));
    }
}
