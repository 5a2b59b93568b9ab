//! Deadline race against a parent promise.
//!
//! [`Promise::timeout`] forwards the parent's settlement on both channels
//! while a timer rejects the result with [`TimedError::Elapsed`] once the
//! interval expires. The two event sources are typed differently (value vs.
//! clock), so this is wired directly rather than through the generic merge
//! combinator; the child's settle-once transition arbitrates the race.

use crate::promise::Promise;
use crate::tracing_compat::trace;
use core::fmt;
use std::convert::Infallible;
use std::thread;
use std::time::Duration;

/// Failure channel of a timed promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedError<E> {
    /// The deadline elapsed before the parent settled.
    Elapsed(Duration),
    /// The parent rejected before the deadline.
    Failed(E),
}

impl<E> TimedError<E> {
    /// Returns true if the deadline elapsed.
    #[must_use]
    pub const fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }

    /// Returns true if the parent rejected first.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<E: fmt::Display> fmt::Display for TimedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elapsed(interval) => write!(f, "operation timed out after {interval:?}"),
            Self::Failed(failure) => write!(f, "operation failed before the deadline: {failure}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TimedError<E> {}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Races the promise against a deadline.
    ///
    /// The result mirrors the parent's settlement unless `interval` elapses
    /// first, in which case it rejects with [`TimedError::Elapsed`]. A
    /// settlement and an expiry racing within the same instant still produce
    /// exactly one observable result.
    #[must_use]
    pub fn timeout(&self, interval: Duration) -> Promise<T, TimedError<E>> {
        let child = Promise::new();
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(value),
            move |failure| on_reject.reject(TimedError::Failed(failure)),
        );

        let on_expiry = child.clone();
        spawn_timer(interval, move || {
            // The check only avoids a wasted rejection; settle-once is the
            // actual guard.
            if !on_expiry.is_settled() {
                trace!(?interval, "timeout elapsed before settlement");
                on_expiry.reject(TimedError::Elapsed(interval));
            }
        });

        child
    }
}

/// Returns a never-failing promise that fulfills once `interval` elapses.
///
/// The natural source of cancellers and delays.
#[must_use]
pub fn after(interval: Duration) -> Promise<(), Infallible> {
    let promise = Promise::new();
    let on_expiry = promise.clone();
    spawn_timer(interval, move || on_expiry.fulfill(()));
    promise
}

fn spawn_timer(interval: Duration, fire: impl FnOnce() + Send + 'static) {
    thread::Builder::new()
        .name("promissory-timer".into())
        .spawn(move || {
            thread::sleep(interval);
            fire();
        })
        .expect("failed to spawn timer thread");
}
