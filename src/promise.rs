//! Single-settlement promise core.
//!
//! A [`Promise`] transitions through exactly one of three states:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   PROMISE STATE MACHINE                  │
//! │                                                          │
//! │                ┌── fulfill(v) ──► Fulfilled(v)           │
//! │    Pending ────┤                                         │
//! │                └── reject(e) ───► Rejected(e)            │
//! │                                                          │
//! │    Settled states are terminal; later settlement         │
//! │    attempts are silent no-ops.                           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers attached while Pending are drained exactly once at the
//! transition and invoked in registration order on the settling thread.
//! Subscribers attached after settlement fire synchronously on the
//! registering thread. Callbacks always run outside the state lock, so user
//! code may chain, subscribe, or settle other promises freely from within a
//! callback.
//!
//! # Thread Safety
//!
//! Handles are cheap clones of one shared state; `fulfill` and `reject` may
//! race from any number of threads and exactly one transition wins. The
//! promise imposes no scheduling of its own: whoever settles, runs the
//! pending callbacks.
//!
//! # Example
//!
//! ```
//! use promissory::Promise;
//!
//! let promise = Promise::<u32, &str>::new();
//! let worker = promise.clone();
//! std::thread::spawn(move || worker.fulfill(42));
//! assert_eq!(promise.wait(), Ok(42));
//! ```

use crate::lock::ReentrantLock;
use crate::tracing_compat::trace;
use smallvec::SmallVec;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// The settlement state of a promise.
enum State<T, E> {
    /// No value is available yet.
    Pending,
    /// The asynchronous work succeeded.
    Fulfilled(T),
    /// The asynchronous work failed.
    Rejected(E),
}

/// A paired set of callbacks representing a single subscriber.
///
/// Only one side ever fires; the other is dropped unused at settlement.
struct Subscriber<T, E> {
    on_fulfill: Box<dyn FnOnce(T) + Send>,
    on_reject: Box<dyn FnOnce(E) + Send>,
}

struct Shared<T, E> {
    state: State<T, E>,
    subscribers: SmallVec<[Subscriber<T, E>; 2]>,
}

struct Inner<T, E> {
    shared: ReentrantLock<Shared<T, E>>,
}

#[cfg(debug_assertions)]
impl<T, E> Drop for Inner<T, E> {
    fn drop(&mut self) {
        self.shared.with(|shared| {
            debug_assert!(
                !(matches!(shared.state, State::Pending) && !shared.subscribers.is_empty()),
                "promise dropped while pending with subscribers attached; they can never fire"
            );
        });
    }
}

/// A container for the eventual result of an asynchronous operation.
///
/// `Promise<T, E>` is a handle; cloning it shares the underlying state. The
/// owner (or any holder of a handle) settles it exactly one effective time
/// with [`fulfill`](Self::fulfill) or [`reject`](Self::reject), and each
/// subscriber observes the result exactly once, even when it attaches after
/// settlement.
pub struct Promise<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates an unsettled promise.
    ///
    /// The caller is responsible for eventually calling
    /// [`fulfill`](Self::fulfill) or [`reject`](Self::reject) on some handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: ReentrantLock::new(Shared {
                    state: State::Pending,
                    subscribers: SmallVec::new(),
                }),
            }),
        }
    }

    /// Returns a promise already fulfilled with `value`.
    #[must_use]
    pub fn fulfilled(value: T) -> Self {
        let promise = Self::new();
        promise.fulfill(value);
        promise
    }

    /// Returns a promise already rejected with `failure`.
    #[must_use]
    pub fn rejected(failure: E) -> Self {
        let promise = Self::new();
        promise.reject(failure);
        promise
    }

    /// Returns a promise settled from `result`.
    #[must_use]
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::fulfilled(value),
            Err(failure) => Self::rejected(failure),
        }
    }

    /// Satisfies the promise with `value` unless it has already settled.
    ///
    /// Subscribers registered while the promise was pending are invoked in
    /// registration order, on the calling thread, after the state lock has
    /// been released. Settling an already-settled promise is a no-op.
    pub fn fulfill(&self, value: T) {
        let drained = self.inner.shared.with(|shared| {
            if !matches!(shared.state, State::Pending) {
                return None;
            }
            shared.state = State::Fulfilled(value.clone());
            Some(mem::take(&mut shared.subscribers))
        });
        let Some(subscribers) = drained else { return };
        trace!(subscribers = subscribers.len(), "promise fulfilled");
        for subscriber in subscribers {
            (subscriber.on_fulfill)(value.clone());
        }
    }

    /// Fails the promise with `failure` unless it has already settled.
    ///
    /// Mirrors [`fulfill`](Self::fulfill) on the rejection channel.
    pub fn reject(&self, failure: E) {
        let drained = self.inner.shared.with(|shared| {
            if !matches!(shared.state, State::Pending) {
                return None;
            }
            shared.state = State::Rejected(failure.clone());
            Some(mem::take(&mut shared.subscribers))
        });
        let Some(subscribers) = drained else { return };
        trace!(subscribers = subscribers.len(), "promise rejected");
        for subscriber in subscribers {
            (subscriber.on_reject)(failure.clone());
        }
    }

    /// Registers callbacks to be invoked when the promise settles.
    ///
    /// If the promise is already settled, the matching callback runs
    /// immediately on the current thread, after the state lock has been
    /// released. Exactly one of the two callbacks ever fires, exactly once.
    pub fn subscribe(
        &self,
        on_fulfill: impl FnOnce(T) + Send + 'static,
        on_reject: impl FnOnce(E) + Send + 'static,
    ) {
        enum Registration<T, E> {
            Stored,
            FireFulfill(Box<dyn FnOnce(T) + Send>, T),
            FireReject(Box<dyn FnOnce(E) + Send>, E),
        }

        let on_fulfill: Box<dyn FnOnce(T) + Send> = Box::new(on_fulfill);
        let on_reject: Box<dyn FnOnce(E) + Send> = Box::new(on_reject);
        let registration = self.inner.shared.with(move |shared| match &shared.state {
            State::Pending => {
                shared.subscribers.push(Subscriber {
                    on_fulfill,
                    on_reject,
                });
                Registration::Stored
            }
            State::Fulfilled(value) => Registration::FireFulfill(on_fulfill, value.clone()),
            State::Rejected(failure) => Registration::FireReject(on_reject, failure.clone()),
        });
        match registration {
            Registration::Stored => {}
            Registration::FireFulfill(callback, value) => {
                trace!("late subscription on fulfilled promise");
                callback(value);
            }
            Registration::FireReject(callback, failure) => {
                trace!("late subscription on rejected promise");
                callback(failure);
            }
        }
    }

    /// Consumes both channels, terminating a chain.
    ///
    /// Alias of [`subscribe`](Self::subscribe) for terminal consumption.
    pub fn sink(
        &self,
        on_fulfill: impl FnOnce(T) + Send + 'static,
        on_reject: impl FnOnce(E) + Send + 'static,
    ) {
        self.subscribe(on_fulfill, on_reject);
    }

    /// Forwards this promise's eventual settlement into `target`.
    pub(crate) fn pipe(&self, target: &Self) {
        let on_fulfill = target.clone();
        let on_reject = target.clone();
        self.subscribe(
            move |value| on_fulfill.fulfill(value),
            move |failure| on_reject.reject(failure),
        );
    }

    /// Best-effort non-blocking peek at the settled result.
    ///
    /// Returns `None` while pending.
    #[must_use]
    pub fn result(&self) -> Option<Result<T, E>> {
        self.inner.shared.with(|shared| match &shared.state {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(failure) => Some(Err(failure.clone())),
        })
    }

    /// Returns true once the promise has left the pending state.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner
            .shared
            .with(|shared| !matches!(shared.state, State::Pending))
    }
}

impl<T, E> Default for Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.shared.with(|shared| match shared.state {
            State::Pending => "Pending",
            State::Fulfilled(_) => "Fulfilled",
            State::Rejected(_) => "Rejected",
        });
        write!(f, "Promise({state})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn starts_pending() {
        let promise = Promise::<u32, &str>::new();
        assert!(!promise.is_settled());
        assert_eq!(promise.result(), None);
    }

    #[test]
    fn fulfill_settles_once() {
        let promise = Promise::<u32, &str>::new();
        promise.fulfill(1);
        promise.fulfill(2);
        promise.reject("late");
        assert_eq!(promise.result(), Some(Ok(1)));
    }

    #[test]
    fn reject_settles_once() {
        let promise = Promise::<u32, &str>::new();
        promise.reject("boom");
        promise.fulfill(7);
        assert_eq!(promise.result(), Some(Err("boom")));
    }

    #[test]
    fn pending_subscriber_fires_on_fulfill() {
        let promise = Promise::<u32, &str>::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        promise.subscribe(
            move |value| {
                assert_eq!(value, 9);
                counter.fetch_add(1, Ordering::SeqCst);
            },
            |_| panic!("rejection channel must not fire"),
        );
        promise.fulfill(9);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_subscriber_fires_synchronously() {
        let promise = Promise::<u32, &str>::rejected("gone");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        promise.subscribe(
            |_| panic!("fulfillment channel must not fire"),
            move |failure| {
                assert_eq!(failure, "gone");
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribers_fire_in_registration_order() {
        let promise = Promise::<u32, &str>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..4 {
            let log = Arc::clone(&log);
            promise.subscribe(
                move |_| log.lock().expect("log lock poisoned").push(tag),
                |_| {},
            );
        }
        promise.fulfill(0);
        assert_eq!(*log.lock().expect("log lock poisoned"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn callback_may_subscribe_to_the_same_promise() {
        let promise = Promise::<u32, &str>::new();
        let reentered = Arc::new(AtomicUsize::new(0));
        let handle = promise.clone();
        let counter = Arc::clone(&reentered);
        promise.subscribe(
            move |_| {
                // By the time this runs the promise is settled, so the inner
                // subscription fires immediately on this thread.
                let counter = Arc::clone(&counter);
                handle.subscribe(
                    move |value| {
                        assert_eq!(value, 3);
                        counter.fetch_add(1, Ordering::SeqCst);
                    },
                    |_| {},
                );
            },
            |_| {},
        );
        promise.fulfill(3);
        assert_eq!(reentered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_resettle_without_effect() {
        let promise = Promise::<u32, &str>::new();
        let handle = promise.clone();
        promise.subscribe(move |_| handle.reject("too late"), |_| {});
        promise.fulfill(5);
        assert_eq!(promise.result(), Some(Ok(5)));
    }

    #[test]
    fn factories_settle_immediately() {
        assert_eq!(Promise::<u32, &str>::fulfilled(4).result(), Some(Ok(4)));
        assert_eq!(
            Promise::<u32, &str>::rejected("no").result(),
            Some(Err("no"))
        );
        assert_eq!(Promise::from_result(Ok::<u32, &str>(8)).result(), Some(Ok(8)));
        assert_eq!(
            Promise::from_result(Err::<u32, &str>("bad")).result(),
            Some(Err("bad"))
        );
    }

    #[test]
    fn debug_shows_state_tag() {
        let promise = Promise::<u32, &str>::new();
        assert_eq!(format!("{promise:?}"), "Promise(Pending)");
        promise.fulfill(1);
        assert_eq!(format!("{promise:?}"), "Promise(Fulfilled)");
        let rejected = Promise::<u32, &str>::rejected("x");
        assert_eq!(format!("{rejected:?}"), "Promise(Rejected)");
    }

    proptest! {
        #[test]
        fn first_settlement_wins(values in proptest::collection::vec(any::<u32>(), 1..8)) {
            let promise = Promise::<u32, &str>::new();
            for &value in &values {
                promise.fulfill(value);
            }
            prop_assert_eq!(promise.result(), Some(Ok(values[0])));
        }
    }
}
