//! Transformation operators derived from `subscribe`.
//!
//! Every operator allocates a fresh child promise and wires it to the
//! parent's settlement; none touches the subscriber list directly. Failure
//! handling follows one propagation rule: rejection flows downstream
//! untouched until an absorbing operator ([`catch`](Promise::catch),
//! [`recover`](Promise::recover)) consumes it.
//!
//! Fallible transforms ([`try_map`](Promise::try_map),
//! [`try_and_then`](Promise::try_and_then)) convert an `Err` returned by the
//! transform into a rejection of the child rather than surfacing it to the
//! caller.

use crate::promise::Promise;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;

/// A cloneable, type-erased failure produced by
/// [`erase_err`](Promise::erase_err).
///
/// Erasure is confined to this boundary operator; the core stays generic
/// over the caller's failure type.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Transforms the fulfillment value; rejection is forwarded unchanged.
    #[must_use]
    pub fn map<U>(&self, transform: impl FnOnce(T) -> U + Send + 'static) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(transform(value)),
            move |failure| on_reject.reject(failure),
        );
        child
    }

    /// Chains another promise using the fulfillment value.
    ///
    /// The monadic bind: the child mirrors the inner promise's eventual
    /// settlement. Rejection of the parent short-circuits the transform.
    #[must_use]
    pub fn and_then<U>(
        &self,
        transform: impl FnOnce(T) -> Promise<U, E> + Send + 'static,
    ) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| transform(value).pipe(&on_fulfill),
            move |failure| on_reject.reject(failure),
        );
        child
    }

    /// `map` whose transform may fail; an `Err` rejects the child.
    #[must_use]
    pub fn try_map<U>(
        &self,
        transform: impl FnOnce(T) -> Result<U, E> + Send + 'static,
    ) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| match transform(value) {
                Ok(output) => on_fulfill.fulfill(output),
                Err(failure) => on_fulfill.reject(failure),
            },
            move |failure| on_reject.reject(failure),
        );
        child
    }

    /// `and_then` whose transform may fail; an `Err` rejects the child.
    #[must_use]
    pub fn try_and_then<U>(
        &self,
        transform: impl FnOnce(T) -> Result<Promise<U, E>, E> + Send + 'static,
    ) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
    {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| match transform(value) {
                Ok(inner) => inner.pipe(&on_fulfill),
                Err(failure) => on_fulfill.reject(failure),
            },
            move |failure| on_reject.reject(failure),
        );
        child
    }

    /// Converts the failure type; fulfillment is forwarded unchanged.
    #[must_use]
    pub fn map_err<F>(&self, transform: impl FnOnce(E) -> F + Send + 'static) -> Promise<T, F>
    where
        F: Clone + Send + 'static,
    {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(value),
            move |failure| on_reject.reject(transform(failure)),
        );
        child
    }

    /// Replaces any failure with a fallback value, producing an error-free
    /// promise.
    #[must_use]
    pub fn recover(&self, transform: impl FnOnce(E) -> T + Send + 'static) -> Promise<T, Infallible> {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(value),
            move |failure| on_reject.fulfill(transform(failure)),
        );
        child
    }

    /// Replaces any failure with a constant fallback value.
    #[must_use]
    pub fn unwrap_or(&self, fallback: T) -> Promise<T, Infallible> {
        self.recover(move |_| fallback)
    }

    /// Erases the failure type behind a shared trait object.
    #[must_use]
    pub fn erase_err(&self) -> Promise<T, SharedError>
    where
        E: Error + Send + Sync,
    {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(value),
            move |failure| on_reject.reject(Arc::new(failure) as SharedError),
        );
        child
    }

    /// Packs either channel into a `Result`, producing an error-free
    /// promise.
    #[must_use]
    pub fn pack_result(&self) -> Promise<Result<T, E>, Infallible> {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(Ok(value)),
            move |failure| on_reject.fulfill(Err(failure)),
        );
        child
    }

    /// Discards the fulfillment value, keeping only the settlement signal.
    #[must_use]
    pub fn discard(&self) -> Promise<(), E> {
        self.map(|_| ())
    }

    /// Runs `receive` on fulfillment without changing the chain.
    pub fn inspect(&self, receive: impl FnOnce(T) + Send + 'static) -> Self {
        self.subscribe(receive, |_| {});
        self.clone()
    }

    /// Runs `receive` on rejection without changing the chain.
    pub fn inspect_err(&self, receive: impl FnOnce(E) + Send + 'static) -> Self {
        self.subscribe(|_| {}, receive);
        self.clone()
    }

    /// Runs `receive` when the promise settles, on either channel.
    pub fn finally(&self, receive: impl FnOnce() + Send + 'static) -> Self {
        // One FnOnce serves both channels; only one of them ever fires.
        let receive = Arc::new(Mutex::new(Some(receive)));
        let on_reject = Arc::clone(&receive);
        self.subscribe(
            move |_| {
                if let Some(receive) = receive.lock().take() {
                    receive();
                }
            },
            move |_| {
                if let Some(receive) = on_reject.lock().take() {
                    receive();
                }
            },
        );
        self.clone()
    }

    /// Absorbs any failure, executing `receive` and producing an error-free
    /// settlement signal.
    pub fn catch(&self, receive: impl FnOnce(E) + Send + 'static) -> Promise<(), Infallible> {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |_| on_fulfill.fulfill(()),
            move |failure| {
                receive(failure);
                on_reject.fulfill(());
            },
        );
        child
    }
}

impl<U, E> Promise<Result<U, E>, E>
where
    U: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Extracts the payload from a `Result` output, forwarding errors onto
    /// the failure channel.
    ///
    /// Inverse of [`pack_result`](Promise::pack_result).
    #[must_use]
    pub fn unpack_result(&self) -> Promise<U, E> {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |result| match result {
                Ok(value) => on_fulfill.fulfill(value),
                Err(failure) => on_fulfill.reject(failure),
            },
            move |failure| on_reject.reject(failure),
        );
        child
    }
}

impl<T> Promise<T, Infallible>
where
    T: Clone + Send + 'static,
{
    /// Consumes the fulfillment value of a promise that cannot fail.
    pub fn sink_ok(&self, receive: impl FnOnce(T) + Send + 'static) {
        self.subscribe(receive, |never| match never {});
    }
}
