mod members_injection;
mod private_method;
mod provision;

use std::collections::HashMap;
use std::rc::Rc;

use proc_macro2::Ident;
use quote::quote;
use syn::Type;

use crate::binding::{Binding, BindingKind, BindingRequest, Key, RequestKind};
use crate::error::{CodegenError, MissingBindingSnafu};
use crate::expr::Expression;
use crate::implementation::{
    ComponentImplementation, FieldSpec, MethodKind, MethodSpec, ShardId,
};

pub use members_injection::MembersInjectionBindingRepresentation;
pub use private_method::PrivateMethodRequestRepresentation;
pub use provision::ProvisionBindingRepresentation;

/// The strategy for satisfying one request against one binding.
///
/// Implementations are memoized per `(binding, request kind)` pair, so a
/// representation may lazily add members to the implementation on first use
/// and hand out references to them afterwards.
pub trait RequestRepresentation {
    /// Produces the expression a call site inside `requesting` uses to
    /// satisfy the request.
    ///
    /// # Errors
    ///
    /// Fails when the underlying value expression cannot be produced.
    fn dependency_expression(
        &self,
        requesting: ShardId,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError>;

    /// Produces the expression backing a method on the component's public
    /// surface. Defaults to the ordinary expression as seen from the root;
    /// strategies that can answer a public method more directly override it.
    fn dependency_expression_for_component_method(
        &self,
        _descriptor: &ComponentMethodDescriptor,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        self.dependency_expression(ComponentImplementation::COMPONENT_SHARD, cx)
    }
}

/// The strategy family for one binding, handing out one
/// [`RequestRepresentation`] per request kind.
///
/// A closed sum over the binding kinds: each variant carries only the state
/// legal for it, and the value-producing vs members-injection contract is
/// enforced at this seam.
pub enum BindingRepresentation {
    Provision(ProvisionBindingRepresentation),
    MembersInjection(MembersInjectionBindingRepresentation),
}

impl BindingRepresentation {
    fn new(binding: Binding, shard: ShardId, cx: &mut ComponentImplementation) -> Self {
        match binding.kind() {
            BindingKind::Provision => {
                Self::Provision(ProvisionBindingRepresentation::new(binding, shard))
            }
            BindingKind::MembersInjection => Self::MembersInjection(
                MembersInjectionBindingRepresentation::new(binding, shard, cx),
            ),
        }
    }

    /// Returns the memoized representation for `request`, creating it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Fails when the binding cannot satisfy the request's kind.
    fn request_representation(
        &mut self,
        request: &BindingRequest,
        cx: &mut ComponentImplementation,
    ) -> Result<Rc<dyn RequestRepresentation>, CodegenError> {
        match self {
            Self::Provision(provision) => provision.request_representation(request, cx),
            Self::MembersInjection(members) => members.request_representation(request),
        }
    }
}

/// A method on the component's public surface, as declared by the caller.
#[derive(Debug, Clone)]
pub struct ComponentMethodDescriptor {
    name: String,
    request: BindingRequest,
}

impl ComponentMethodDescriptor {
    pub fn new(name: impl Into<String>, request: BindingRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &BindingRequest {
        &self.request
    }
}

/// The top-level expression factory for one component.
///
/// Dispatches each request to its binding's strategy family, memoizing the
/// chosen strategies so that repeated requests share the members they
/// created. Bindings are assigned to shards here, in arrival order.
pub struct ComponentRequestRepresentations {
    representations: HashMap<Key, BindingRepresentation>,
}

impl ComponentRequestRepresentations {
    /// `methods` is the component's declared public surface; its names are
    /// reserved before any representation may issue one, so generated
    /// accessors never shadow a declared method.
    pub fn new(
        bindings: Vec<Binding>,
        methods: &[ComponentMethodDescriptor],
        cx: &mut ComponentImplementation,
    ) -> Self {
        for descriptor in methods {
            cx.claim_method_name(descriptor.name());
        }
        let mut representations = HashMap::new();
        for binding in bindings {
            let shard = cx.shard_for_binding(binding.key());
            let key = binding.key().clone();
            representations.insert(key, BindingRepresentation::new(binding, shard, cx));
        }
        Self { representations }
    }

    /// Produces the expression satisfying `request` at a call site inside
    /// `requesting`.
    ///
    /// # Errors
    ///
    /// Fails when no binding produces the requested key, or when the binding
    /// cannot satisfy the request's kind.
    pub fn dependency_expression(
        &mut self,
        request: &BindingRequest,
        requesting: ShardId,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        let representation = self.representation_for(request)?;
        representation
            .request_representation(request, cx)?
            .dependency_expression(requesting, cx)
    }

    /// Implements one method of the component's public surface, adding it to
    /// the root unit.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as
    /// [`ComponentRequestRepresentations::dependency_expression`].
    pub fn write_component_method(
        &mut self,
        descriptor: &ComponentMethodDescriptor,
        cx: &mut ComponentImplementation,
    ) -> Result<(), CodegenError> {
        cx.claim_method_name(descriptor.name());
        let representation = self.representation_for(descriptor.request())?;
        let expression = representation
            .request_representation(descriptor.request(), cx)?
            .dependency_expression_for_component_method(descriptor, cx)?;

        let method = match descriptor.request().kind() {
            RequestKind::MembersInjection => {
                let target = descriptor.request().key().ty().clone();
                MethodSpec::new(descriptor.name(), None, expression.tokens().clone()).with_params(
                    vec![FieldSpec::new(
                        "instance",
                        Type::Verbatim(quote!(&mut #target)),
                    )],
                )
            }
            _ => MethodSpec::new(
                descriptor.name(),
                Some(expression.ty().clone()),
                expression.tokens().clone(),
            ),
        };
        cx.add_method(
            ComponentImplementation::COMPONENT_SHARD,
            MethodKind::ComponentMethod,
            method,
        );
        Ok(())
    }

    fn representation_for(
        &mut self,
        request: &BindingRequest,
    ) -> Result<&mut BindingRepresentation, CodegenError> {
        self.representations
            .get_mut(request.key())
            .ok_or_else(|| {
                MissingBindingSnafu {
                    key: request.key().clone(),
                }
                .build()
            })
    }
}

/// Renders the call through which `requesting` invokes a method owned by
/// `owning`: a plain `self` call locally, a path through the shard references
/// otherwise.
fn method_call(
    cx: &mut ComponentImplementation,
    requesting: ShardId,
    owning: ShardId,
    method: &str,
) -> proc_macro2::TokenStream {
    let receiver = cx.shard_field_reference(requesting, owning);
    let method = Ident::new(method, proc_macro2::Span::call_site());
    quote!(#receiver.#method())
}
