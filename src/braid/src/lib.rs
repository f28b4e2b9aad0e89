pub mod factory;
pub mod provider;

pub use factory::InstanceFactory;
pub use provider::{DoubleCheck, Lazy, Provider, Shared, SingleCheck};
