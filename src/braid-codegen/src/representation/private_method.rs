use std::cell::OnceCell;
use std::rc::Rc;

use syn::Type;

use crate::binding::BindingRequest;
use crate::error::CodegenError;
use crate::expr::Expression;
use crate::implementation::{ComponentImplementation, MethodKind, MethodSpec, ShardId};
use crate::representation::{method_call, RequestRepresentation};

/// Satisfies a request through a private no-argument method on the owning
/// shard, so that every call site shares one occurrence of the wrapped
/// expression.
///
/// The method is created once, on the first expression request; the name is
/// published before the body is computed, so a request for the same pair
/// arriving while the body is being built resolves to a call to the method
/// instead of recursing into the wrapped strategy.
pub struct PrivateMethodRequestRepresentation {
    request: BindingRequest,
    shard: ShardId,
    return_ty: Type,
    wrapped: Rc<dyn RequestRepresentation>,
    method_name: OnceCell<String>,
}

impl PrivateMethodRequestRepresentation {
    pub fn new(
        request: BindingRequest,
        shard: ShardId,
        return_ty: Type,
        wrapped: Rc<dyn RequestRepresentation>,
    ) -> Self {
        Self {
            request,
            shard,
            return_ty,
            wrapped,
            method_name: OnceCell::new(),
        }
    }

    fn method_name(&self, cx: &mut ComponentImplementation) -> Result<String, CodegenError> {
        if let Some(name) = self.method_name.get() {
            return Ok(name.clone());
        }

        let name = cx.unique_method_name_for_request(&self.request);
        // Published before the body is computed so reentrant requests see it.
        if self.method_name.set(name.clone()).is_err() {
            unreachable!("`method_name` is checked empty above");
        }
        let body = self.wrapped.dependency_expression(self.shard, cx)?;
        cx.add_method(
            self.shard,
            MethodKind::PrivateMethod,
            MethodSpec::new(&name, Some(self.return_ty.clone()), body.tokens().clone()),
        );
        Ok(name)
    }
}

impl RequestRepresentation for PrivateMethodRequestRepresentation {
    fn dependency_expression(
        &self,
        requesting: ShardId,
        cx: &mut ComponentImplementation,
    ) -> Result<Expression, CodegenError> {
        let name = self.method_name(cx)?;
        let tokens = method_call(cx, requesting, self.shard, &name);
        Ok(Expression::new(self.return_ty.clone(), tokens))
    }
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::parse_quote;

    use crate::binding::{Key, RequestKind};

    use super::*;

    struct RawValue;

    impl RequestRepresentation for RawValue {
        fn dependency_expression(
            &self,
            _requesting: ShardId,
            _cx: &mut ComponentImplementation,
        ) -> Result<Expression, CodegenError> {
            Ok(Expression::new(
                parse_quote!(Database),
                quote!(Database::connect()),
            ))
        }
    }

    fn implementation(bindings_per_shard: usize) -> ComponentImplementation {
        ComponentImplementation::new(
            "AppComponent",
            std::num::NonZeroUsize::new(bindings_per_shard).unwrap(),
        )
    }

    fn representation(shard: ShardId) -> PrivateMethodRequestRepresentation {
        PrivateMethodRequestRepresentation::new(
            BindingRequest::new(Key::of(parse_quote!(Database)), RequestKind::Instance),
            shard,
            parse_quote!(Database),
            Rc::new(RawValue),
        )
    }

    #[test]
    fn repeated_requests_share_one_private_method() {
        let mut cx = implementation(8);
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let representation = representation(shard);

        let first = representation.dependency_expression(shard, &mut cx).unwrap();
        let second = representation.dependency_expression(shard, &mut cx).unwrap();
        assert_eq!(first.tokens().to_string(), second.tokens().to_string());

        let assembled = cx.generate();
        assert_eq!(assembled.methods().len(), 1);
        assert_eq!(assembled.methods()[0].name(), "database");
    }

    #[test]
    fn local_call_sites_call_through_self() {
        let mut cx = implementation(8);
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let representation = representation(shard);

        let expression = representation.dependency_expression(shard, &mut cx).unwrap();
        assert_eq!(
            expression.tokens().to_string(),
            quote!(self.database()).to_string(),
        );
    }

    #[test]
    fn foreign_call_sites_route_through_the_shard_reference() {
        let mut cx = implementation(1);
        let shard = cx.shard_for_binding(&Key::of(parse_quote!(Database)));
        let other = cx.shard_for_binding(&Key::of(parse_quote!(Config)));
        let representation = representation(other);

        let expression = representation.dependency_expression(shard, &mut cx).unwrap();
        assert_eq!(
            expression.tokens().to_string(),
            quote!(self.app_component_shard.database()).to_string(),
        );
    }
}
