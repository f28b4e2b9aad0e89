use quote::quote;
use syn::Type;

use crate::binding::Binding;
use crate::error::{CodegenError, UnscopedBindingSnafu};
use crate::expr::Expression;

/// Wraps an unscoped creation expression with the caching strategy selected
/// by the binding's scope.
///
/// A reusable scope gets the single-check wrapper: racing threads may build
/// duplicates that are discarded, which is acceptable because reusable
/// constructions are side-effect-free. Any other scope gets the double-check
/// wrapper, which guarantees that at most one instance is ever retained.
/// This binary choice is the whole scoping policy.
///
/// # Errors
///
/// Returns [`CodegenError::UnscopedBinding`] if the binding carries no scope.
/// Scope assignment happens upstream; a missing scope here is an internal
/// defect, not a user error.
pub fn scope(binding: &Binding, unscoped: Expression) -> Result<Expression, CodegenError> {
    let Some(scope) = binding.scope() else {
        return UnscopedBindingSnafu {
            key: binding.key().clone(),
        }
        .fail();
    };

    let inner_ty = unscoped.ty();
    let inner = unscoped.tokens();
    let (ty, tokens) = if scope.is_reusable() {
        (
            Type::Verbatim(quote!(braid::SingleCheck<#inner_ty>)),
            quote!(braid::SingleCheck::provider(#inner)),
        )
    } else {
        (
            Type::Verbatim(quote!(braid::DoubleCheck<#inner_ty>)),
            quote!(braid::DoubleCheck::provider(#inner)),
        )
    };
    Ok(Expression::new(ty, tokens))
}

#[cfg(test)]
mod tests {
    use proc_macro2::TokenStream;
    use syn::parse_quote;

    use crate::binding::{Key, Scope};

    use super::*;

    fn scoped_binding(scope: Scope) -> Binding {
        Binding::provision(Key::of(parse_quote!(Database)), quote!(Database::connect()))
            .with_scope(scope)
    }

    fn unscoped_expression() -> Expression {
        Expression::new(
            Type::Verbatim(quote!(braid::InstanceFactory<Database>)),
            quote!(braid::InstanceFactory::create(Database::connect())),
        )
    }

    fn contains_verbatim(wrapped: &TokenStream, inner: &TokenStream) -> bool {
        wrapped.to_string().contains(&inner.to_string())
    }

    #[test]
    fn scope_wraps_reusable_bindings_in_single_check() {
        let binding = scoped_binding(Scope::reusable());
        let inner = unscoped_expression();
        let inner_tokens = inner.tokens().clone();

        let scoped = scope(&binding, inner).unwrap();
        assert_eq!(
            scoped.tokens().to_string(),
            quote!(braid::SingleCheck::provider(braid::InstanceFactory::create(
                Database::connect()
            )))
            .to_string(),
        );
        assert!(contains_verbatim(scoped.tokens(), &inner_tokens));
    }

    #[test]
    fn scope_wraps_strict_bindings_in_double_check() {
        let binding = scoped_binding(Scope::strict());
        let inner = unscoped_expression();
        let inner_tokens = inner.tokens().clone();

        let scoped = scope(&binding, inner).unwrap();
        assert_eq!(
            scoped.tokens().to_string(),
            quote!(braid::DoubleCheck::provider(braid::InstanceFactory::create(
                Database::connect()
            )))
            .to_string(),
        );
        assert!(contains_verbatim(scoped.tokens(), &inner_tokens));
    }

    #[test]
    fn scope_fails_on_bindings_without_a_scope() {
        let binding =
            Binding::provision(Key::of(parse_quote!(Database)), quote!(Database::connect()));

        assert!(matches!(
            scope(&binding, unscoped_expression()),
            Err(CodegenError::UnscopedBinding { .. })
        ));
    }
}
