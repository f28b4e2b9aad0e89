mod creation;
mod scoping;

pub use creation::{BindingInstanceSupplier, InstanceCreationExpression, InstanceSupplier};
pub use scoping::scope;

#[cfg(test)]
pub use creation::MockInstanceSupplier;

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::Type;

/// A source-level expression paired with the type it evaluates to.
///
/// Expressions are structural: they are handed to the external renderer as
/// token trees and never manipulated as text here.
#[derive(Debug, Clone)]
pub struct Expression {
    ty: Type,
    tokens: TokenStream,
}

impl Expression {
    pub fn new(ty: Type, tokens: TokenStream) -> Self {
        Self { ty, tokens }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }
}

impl ToTokens for Expression {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(self.tokens.clone());
    }
}
