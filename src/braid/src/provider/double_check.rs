use parking_lot::RwLock;

use crate::provider::Provider;

/// A caching provider with strict single-instance semantics.
///
/// At most one value produced by the underlying provider is ever retained or
/// observed, no matter how many threads request it concurrently. Construction
/// happens under the write lock after a read fast path, so this wrapper is
/// safe for constructions with externally visible side effects.
pub struct DoubleCheck<P: Provider> {
    provider: P,
    cached: RwLock<Option<P::Output>>,
}

impl<P> DoubleCheck<P>
where
    P: Provider,
    P::Output: Clone + Send + Sync,
{
    /// Wraps `provider` so that exactly one of its values is ever retained.
    pub fn provider(provider: P) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
        }
    }

}

impl<P> Provider for DoubleCheck<P>
where
    P: Provider,
    P::Output: Clone + Send + Sync,
{
    type Output = P::Output;

    fn get(&self) -> Self::Output {
        if let Some(value) = self.cached.read().as_ref() {
            return value.clone();
        }

        let mut slot = self.cached.write();
        if slot.is_none() {
            *slot = Some(self.provider.get());
        }
        match slot.as_ref() {
            Some(value) => value.clone(),
            None => unreachable!("`slot` should be filled above"),
        }
    }
}

/// A value computed on first access and retained afterwards.
///
/// Backed by [`DoubleCheck`], so the computation runs at most once even under
/// concurrent first access.
pub struct Lazy<P: Provider> {
    inner: DoubleCheck<P>,
}

impl<P> Lazy<P>
where
    P: Provider,
    P::Output: Clone + Send + Sync,
{
    /// Wraps `provider`, deferring its first invocation to the first `get`.
    pub fn new(provider: P) -> Self {
        Self {
            inner: DoubleCheck::provider(provider),
        }
    }

    /// Returns the retained value, computing it on the first call.
    pub fn get(&self) -> P::Output {
        self.inner.get()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn double_check_get_returns_the_same_value_on_every_call() {
        let constructions = AtomicUsize::new(0);
        let provider = DoubleCheck::provider(move || {
            constructions.fetch_add(1, Ordering::SeqCst);
            Arc::new(42)
        });

        let first = provider.get();
        let second = provider.get();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn double_check_get_constructs_at_most_once_under_concurrent_access() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructions);
        let provider = Arc::new(DoubleCheck::provider(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(String::from("value"))
        }));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let provider = Arc::clone(&provider);
                thread::spawn(move || provider.get())
            })
            .collect();
        let values: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("each thread should not `panic!()`"))
            .collect();

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn lazy_get_computes_on_first_access_only() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructions);
        let lazy = Lazy::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            7
        });

        assert_eq!(constructions.load(Ordering::SeqCst), 0);
        assert_eq!(lazy.get(), 7);
        assert_eq!(lazy.get(), 7);
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }
}
