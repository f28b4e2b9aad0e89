use std::rc::Rc;

use proc_macro2::{Ident, Span};
use quote::quote;
use syn::Type;

use crate::binding::{Binding, BindingRequest, Key, RequestKind};
use crate::error::{CodegenError, IllegalRequestSnafu};
use crate::expr::Expression;
use crate::implementation::{
    ComponentImplementation, FieldSpec, MethodKind, MethodSpec, ShardId,
};
use crate::representation::RequestRepresentation;

/// The strategy family for a members-injection binding.
///
/// Only members-injection requests are legal against it, and they all share
/// one representation, built eagerly at construction: a private method on the
/// owning shard that takes the instance by mutable reference and assigns its
/// injected fields.
pub struct MembersInjectionBindingRepresentation {
    key: Key,
    representation: Rc<dyn RequestRepresentation>,
}

impl MembersInjectionBindingRepresentation {
    pub fn new(binding: Binding, shard: ShardId, cx: &mut ComponentImplementation) -> Self {
        Self {
            key: binding.key().clone(),
            representation: Rc::new(MembersInjectionRequestRepresentation::create(
                &binding, shard, cx,
            )),
        }
    }

    /// Returns the single held representation.
    ///
    /// # Errors
    ///
    /// Fails on any request kind other than members-injection; the resolver
    /// must never route provision-style requests here.
    pub fn request_representation(
        &self,
        request: &BindingRequest,
    ) -> Result<Rc<dyn RequestRepresentation>, CodegenError> {
        snafu::ensure!(
            request.kind() == RequestKind::MembersInjection,
            IllegalRequestSnafu {
                key: self.key.clone(),
                kind: request.kind(),
            }
        );
        Ok(self.representation.clone())
    }
}

/// A call to the shard's private injection method. The method itself is
/// created eagerly, together with this representation.
struct MembersInjectionRequestRepresentation {
    method_name: String,
    shard: ShardId,
}

impl MembersInjectionRequestRepresentation {
    fn create(binding: &Binding, shard: ShardId, cx: &mut ComponentImplementation) -> Self {
        let request = BindingRequest::new(binding.key().clone(), RequestKind::MembersInjection);
        let method_name = cx.unique_method_name_for_request(&request);
        let target = binding.key().ty();
        let method = MethodSpec::new(&method_name, None, binding.instantiation().clone())
            .with_params(vec![FieldSpec::new(
                "instance",
                Type::Verbatim(quote!(&mut #target)),
            )]);
        cx.add_method(shard, MethodKind::MembersInjectionMethod, method);
        Self { method_name, shard }
    }
}

impl RequestRepresentation for MembersInjectionRequestRepresentation {
    fn dependency_expression(
        &self,
        requesting: ShardId,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        let receiver = cx.shard_field_reference(requesting, self.shard);
        let method = Ident::new(&self.method_name, Span::call_site());
        Ok(Expression::new(
            Type::Verbatim(quote!(())),
            quote!(#receiver.#method(instance)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use quote::{quote, ToTokens};
    use syn::parse_quote;

    use super::*;

    fn implementation() -> ComponentImplementation {
        ComponentImplementation::new("AppComponent", std::num::NonZeroUsize::new(8).unwrap())
    }

    fn binding() -> Binding {
        Binding::members_injection(
            Key::of(parse_quote!(Service)),
            quote!(instance.logger = self.logger();),
        )
    }

    #[test]
    fn every_request_shares_the_one_injection_method() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Service)));
        let representation = MembersInjectionBindingRepresentation::new(binding(), shard, &mut cx);

        let request =
            BindingRequest::new(Key::of(parse_quote!(Service)), RequestKind::MembersInjection);
        let first = representation.request_representation(&request).unwrap();
        let second = representation.request_representation(&request).unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let assembled = cx.generate();
        assert_eq!(assembled.methods().len(), 1);
        assert_eq!(assembled.methods()[0].name(), "inject_service");
    }

    #[test]
    fn injection_method_takes_the_instance_by_mutable_reference() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Service)));
        let representation = MembersInjectionBindingRepresentation::new(binding(), shard, &mut cx);

        let request =
            BindingRequest::new(Key::of(parse_quote!(Service)), RequestKind::MembersInjection);
        let expression = representation
            .request_representation(&request)
            .unwrap()
            .dependency_expression(shard, &mut cx)
            .unwrap();
        assert_eq!(
            expression.tokens().to_string(),
            quote!(self.inject_service(instance)).to_string(),
        );

        let assembled = cx.generate();
        let rendered = assembled.methods()[0].to_token_stream().to_string();
        assert!(rendered.contains("instance : & mut Service"));
    }

    #[test]
    fn provision_style_requests_are_rejected() {
        let mut cx = implementation();
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Service)));
        let representation = MembersInjectionBindingRepresentation::new(binding(), shard, &mut cx);

        for kind in [RequestKind::Instance, RequestKind::Provider, RequestKind::Lazy] {
            let request = BindingRequest::new(Key::of(parse_quote!(Service)), kind);
            assert!(matches!(
                representation.request_representation(&request),
                Err(CodegenError::IllegalRequest { .. })
            ));
        }
    }
}
