use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

use crate::binding::Binding;
use crate::error::CodegenError;
use crate::expr::Expression;

/// A collaborator that yields the raw value expression for a binding.
///
/// The expression describes how to build the bare instance, before any
/// wrapping or caching is applied.
#[cfg_attr(test, mockall::automock)]
pub trait InstanceSupplier {
    /// Produces the raw value expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression cannot be produced; the failure is
    /// propagated unchanged by every wrapper built on top of it.
    fn raw_expression(&self) -> Result<Expression, CodegenError>;
}

/// An [`InstanceSupplier`] reading the resolver-supplied construction
/// expression off a binding.
#[derive(Debug)]
pub struct BindingInstanceSupplier {
    binding: Binding,
}

impl BindingInstanceSupplier {
    pub fn new(binding: Binding) -> Self {
        Self { binding }
    }
}

impl InstanceSupplier for BindingInstanceSupplier {
    fn raw_expression(&self) -> Result<Expression, CodegenError> {
        Ok(Expression::new(
            self.binding.key().ty().clone(),
            self.binding.instantiation().clone(),
        ))
    }
}

/// Produces the expression that wraps a raw value in an instance factory.
///
/// The nullable-safe construction form is emitted when the nullability flag
/// is set, the plain form otherwise. Pure function of its inputs: the only
/// failure mode is a failing supplier, whose error is propagated as is.
pub struct InstanceCreationExpression {
    supplier: Box<dyn InstanceSupplier>,
    nullable: bool,
}

impl InstanceCreationExpression {
    pub fn new(supplier: Box<dyn InstanceSupplier>, nullable: bool) -> Self {
        Self { supplier, nullable }
    }

    pub fn creation_expression(&self) -> Result<Expression, CodegenError> {
        let raw = self.supplier.raw_expression()?;
        let raw_ty = raw.ty();
        let raw_tokens = raw.tokens();

        let tokens: TokenStream = if self.nullable {
            quote!(braid::InstanceFactory::create_nullable(#raw_tokens))
        } else {
            quote!(braid::InstanceFactory::create(#raw_tokens))
        };
        let ty = if self.nullable {
            Type::Verbatim(quote!(braid::InstanceFactory<core::option::Option<#raw_ty>>))
        } else {
            Type::Verbatim(quote!(braid::InstanceFactory<#raw_ty>))
        };
        Ok(Expression::new(ty, tokens))
    }
}
