pub mod binding;
pub mod error;
pub mod expr;
pub mod implementation;
pub mod representation;

pub mod prelude {
    pub use crate::binding::{Binding, BindingKind, BindingRequest, Key, RequestKind, Scope};
    pub use crate::error::CodegenError;
    pub use crate::expr::Expression;
    pub use crate::implementation::{ComponentImplementation, ShardId, TypeSpec};
    pub use crate::representation::{
        ComponentMethodDescriptor, ComponentRequestRepresentations, RequestRepresentation,
    };
}
