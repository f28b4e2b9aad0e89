use parking_lot::RwLock;

use crate::provider::Provider;

/// A caching provider with best-effort single-instance semantics.
///
/// The value is constructed outside the lock, so threads racing on first
/// access may each construct a candidate. The first candidate written to the
/// cache is retained and every later observer receives it; losing candidates
/// are discarded. This is only legal for side-effect-free, idempotent
/// constructions, which the code generator enforces by reserving this wrapper
/// for reusable-scoped bindings.
pub struct SingleCheck<P: Provider> {
    provider: P,
    cached: RwLock<Option<P::Output>>,
}

impl<P> SingleCheck<P>
where
    P: Provider,
    P::Output: Clone + Send + Sync,
{
    /// Wraps `provider` so that all observers converge on one retained value.
    pub fn provider(provider: P) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
        }
    }
}

impl<P> Provider for SingleCheck<P>
where
    P: Provider,
    P::Output: Clone + Send + Sync,
{
    type Output = P::Output;

    fn get(&self) -> Self::Output {
        if let Some(value) = self.cached.read().as_ref() {
            return value.clone();
        }

        let candidate = self.provider.get();
        let mut slot = self.cached.write();
        match slot.as_ref() {
            Some(retained) => retained.clone(),
            None => {
                *slot = Some(candidate.clone());
                candidate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn single_check_get_retains_the_first_constructed_value() {
        let constructions = AtomicUsize::new(0);
        let provider = SingleCheck::provider(move || {
            Arc::new(constructions.fetch_add(1, Ordering::SeqCst))
        });

        let first = provider.get();
        let second = provider.get();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, 0);
    }

    #[test]
    fn single_check_get_converges_under_concurrent_access() {
        let provider = Arc::new(SingleCheck::provider(|| Arc::new(String::from("value"))));

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

        // Duplicate construction is tolerated, but every observer must end up
        // with the one retained value.
        let retained = provider.get();
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &retained)));
    }
}
