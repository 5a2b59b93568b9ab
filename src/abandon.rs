//! Optional-resolution capability split.
//!
//! [`Promise::optionally_resolving`] hands back the promise plus two narrow
//! single-use capabilities: a [`Resolver`] that can only fulfill and a
//! [`Rejector`] that can only reject. Both share one hidden guard whose
//! `Drop` rejects the promise with [`UnresolvedError`] at the moment the
//! second capability is released without either having been invoked.
//!
//! This converts the common "forgot to settle" bug into a deterministic
//! rejection instead of a silently leaked pending promise. Rust's
//! reference-counted, deterministic destruction supplies the trigger
//! directly.

use crate::promise::Promise;
use crate::tracing_compat::trace;
use std::sync::Arc;
use thiserror::Error;

/// Rejection delivered when both settlement capabilities are dropped
/// without being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
#[error("promise was abandoned without being settled")]
pub struct UnresolvedError;

/// Shared by [`Resolver`] and [`Rejector`]; rejects the promise when the
/// last capability releases it.
struct AbandonGuard<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    promise: Promise<T, E>,
}

impl<T, E> Drop for AbandonGuard<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    fn drop(&mut self) {
        trace!("both settlement capabilities released");
        // A no-op if either capability was invoked first.
        self.promise.reject(UnresolvedError.into());
    }
}

/// A single-use capability that can only fulfill its promise.
pub struct Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    promise: Promise<T, E>,
    _guard: Arc<AbandonGuard<T, E>>,
}

impl<T, E> Resolver<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    /// Fulfills the promise with `value`, consuming the capability.
    pub fn fulfill(self, value: T) {
        self.promise.fulfill(value);
    }
}

/// A single-use capability that can only reject its promise.
pub struct Rejector<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    promise: Promise<T, E>,
    _guard: Arc<AbandonGuard<T, E>>,
}

impl<T, E> Rejector<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    /// Rejects the promise with `failure`, consuming the capability.
    pub fn reject(self, failure: E) {
        self.promise.reject(failure);
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<UnresolvedError> + 'static,
{
    /// Creates a promise alongside its split settlement capabilities.
    ///
    /// Dropping both the [`Resolver`] and the [`Rejector`] without invoking
    /// either rejects the promise with [`UnresolvedError`] — at the second
    /// drop, not before.
    #[must_use]
    pub fn optionally_resolving() -> (Self, Resolver<T, E>, Rejector<T, E>) {
        let promise = Self::new();
        let guard = Arc::new(AbandonGuard {
            promise: promise.clone(),
        });
        let resolver = Resolver {
            promise: promise.clone(),
            _guard: Arc::clone(&guard),
        };
        let rejector = Rejector {
            promise: promise.clone(),
            _guard: guard,
        };
        (promise, resolver, rejector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestFailure {
        Unresolved,
        Explicit(&'static str),
    }

    impl From<UnresolvedError> for TestFailure {
        fn from(_: UnresolvedError) -> Self {
            Self::Unresolved
        }
    }

    #[test]
    fn abandonment_rejects_at_the_second_drop() {
        let (promise, resolver, rejector) = Promise::<u32, TestFailure>::optionally_resolving();
        drop(resolver);
        assert_eq!(promise.result(), None, "one live capability keeps it pending");
        drop(rejector);
        assert_eq!(promise.result(), Some(Err(TestFailure::Unresolved)));
    }

    #[test]
    fn resolver_fulfills_and_later_drops_are_no_ops() {
        let (promise, resolver, rejector) = Promise::<u32, TestFailure>::optionally_resolving();
        resolver.fulfill(11);
        assert_eq!(promise.result(), Some(Ok(11)));
        drop(rejector);
        assert_eq!(promise.result(), Some(Ok(11)));
    }

    #[test]
    fn rejector_rejects_with_explicit_failure() {
        let (promise, resolver, rejector) = Promise::<u32, TestFailure>::optionally_resolving();
        rejector.reject(TestFailure::Explicit("declined"));
        drop(resolver);
        assert_eq!(
            promise.result(),
            Some(Err(TestFailure::Explicit("declined")))
        );
    }

    #[test]
    fn unresolved_error_display() {
        assert_eq!(
            UnresolvedError.to_string(),
            "promise was abandoned without being settled"
        );
    }
}
