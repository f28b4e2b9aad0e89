use crate::provider::Provider;

/// A provider backed by an already constructed value.
///
/// Each request receives a clone of the wrapped value. The nullable form
/// wraps an `Option` so that bindings which may legitimately produce no value
/// still satisfy the [`Provider`] contract.
pub struct InstanceFactory<T>
where
    T: Clone + Send + Sync,
{
    instance: T,
}

impl<T> InstanceFactory<T>
where
    T: Clone + Send + Sync,
{
    /// Wraps `instance`, which must not be absent.
    pub fn create(instance: T) -> Self {
        Self { instance }
    }
}

impl<T> InstanceFactory<Option<T>>
where
    T: Clone + Send + Sync,
{
    /// Wraps a possibly absent `instance`.
    pub fn create_nullable(instance: Option<T>) -> Self {
        Self { instance }
    }
}

impl<T> Provider for InstanceFactory<T>
where
    T: Clone + Send + Sync,
{
    type Output = T;

    fn get(&self) -> Self::Output {
        self.instance.clone()
    }
}
