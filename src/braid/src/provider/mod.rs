mod double_check;
mod single_check;

pub use double_check::{DoubleCheck, Lazy};
pub use single_check::SingleCheck;

/// A factory which produces one value per request.
///
/// Generated components hold a [`Provider`] for every binding whose value has
/// to be created on demand. A bare provider constructs a fresh value on each
/// call; the caching wrappers [`DoubleCheck`] and [`SingleCheck`] restrict how
/// many of those values are ever retained. Providers may be shared between
/// threads, so implementations must be [`Send`] and [`Sync`].
pub trait Provider: Send + Sync {
    /// The type of value this provider produces.
    type Output;

    /// Produces a value. Whether the value is newly constructed or a retained
    /// one depends on the implementation.
    fn get(&self) -> Self::Output;
}

impl<T, F> Provider for F
where
    F: Fn() -> T + Send + Sync,
{
    type Output = T;

    fn get(&self) -> Self::Output {
        self()
    }
}

/// A reference-counted handle to a provider.
///
/// Generated components store their providers in `Shared` fields, so every
/// call site can hold the same provider by cloning the field.
pub struct Shared<P: Provider + ?Sized> {
    inner: std::sync::Arc<P>,
}

impl<P: Provider> Shared<P> {
    pub fn new(provider: P) -> Self {
        Self {
            inner: std::sync::Arc::new(provider),
        }
    }
}

impl<P: Provider + ?Sized> Clone for Shared<P> {
    fn clone(&self) -> Self {
        Self {
            inner: std::sync::Arc::clone(&self.inner),
        }
    }
}

impl<P: Provider + ?Sized> Provider for Shared<P> {
    type Output = P::Output;

    fn get(&self) -> Self::Output {
        (*self.inner).get()
    }
}
