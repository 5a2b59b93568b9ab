//! Cooperative cancellation wiring.
//!
//! A canceller is an ordinary never-failing promise of `()`. Wiring it to a
//! target with [`Promise::cancel_by`] produces a child that rejects with
//! [`CancelError::Canceled`] if the canceller fires first and otherwise
//! mirrors the target. Cancellation is purely cooperative: it never stops
//! the work computing the target's value, it only changes what downstream
//! subscribers observe — first write wins, per settle-once.

use crate::promise::Promise;
use crate::tracing_compat::trace;
use core::fmt;
use std::convert::Infallible;

/// Failure channel of a cancellable promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelError<E> {
    /// The canceller fired before the target settled.
    Canceled,
    /// The target rejected on its own.
    Failed(E),
}

impl<E> CancelError<E> {
    /// Returns true if the canceller fired first.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Returns true if the target rejected on its own.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<E: fmt::Display> fmt::Display for CancelError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "operation was cancelled"),
            Self::Failed(failure) => write!(f, "operation failed: {failure}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for CancelError<E> {}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Races the promise against a cancellation signal.
    ///
    /// If `canceller` fires first the result rejects with
    /// [`CancelError::Canceled`]; otherwise the result mirrors the target's
    /// natural settlement.
    #[must_use]
    pub fn cancel_by(&self, canceller: &Promise<(), Infallible>) -> Promise<T, CancelError<E>> {
        let child = Promise::new();

        let on_cancel = child.clone();
        canceller.subscribe(
            move |()| {
                trace!("canceller fired");
                on_cancel.reject(CancelError::Canceled);
            },
            |never| match never {},
        );

        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(value),
            move |failure| on_reject.reject(CancelError::Failed(failure)),
        );

        child
    }
}

impl<T, E> Promise<T, CancelError<E>>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Absorbs a cancellation, forwarding genuine failures.
    ///
    /// `handler` runs only when the rejection is
    /// [`CancelError::Canceled`]; the returned promise then fulfills with
    /// the settlement signal. Genuine failures pass through unwrapped.
    pub fn catch_cancel(&self, handler: impl FnOnce() + Send + 'static) -> Promise<(), E> {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |_| on_fulfill.fulfill(()),
            move |failure| match failure {
                CancelError::Canceled => {
                    handler();
                    on_reject.fulfill(());
                }
                CancelError::Failed(failure) => on_reject.reject(failure),
            },
        );
        child
    }
}
