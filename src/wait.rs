//! Blocking wait escape hatch.
//!
//! The core never parks a thread; "waiting" is expressed by registering a
//! callback. These helpers exist for the boundary where callback-driven code
//! meets thread-blocking code (tests, `main`, shutdown paths): they park the
//! calling thread on a condition variable until settlement.

use crate::promise::Promise;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Parked<T, E> = Arc<(Mutex<Option<Result<T, E>>>, Condvar)>;

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Blocks the calling thread until the promise settles.
    ///
    /// Blocks forever on a promise that is never settled; prefer
    /// [`wait_timeout`](Self::wait_timeout) when that is a possibility.
    #[must_use]
    pub fn wait(&self) -> Result<T, E> {
        let parked = self.park();
        let (slot, condvar) = &*parked;
        let mut guard = slot.lock();
        loop {
            if let Some(result) = guard.take() {
                return result;
            }
            condvar.wait(&mut guard);
        }
    }

    /// Blocks the calling thread until the promise settles or `timeout`
    /// elapses, whichever comes first.
    ///
    /// Returns `None` if the promise was still pending at the deadline.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, E>> {
        let deadline = Instant::now() + timeout;
        let parked = self.park();
        let (slot, condvar) = &*parked;
        let mut guard = slot.lock();
        loop {
            if let Some(result) = guard.take() {
                return Some(result);
            }
            if condvar.wait_until(&mut guard, deadline).timed_out() {
                return guard.take();
            }
        }
    }

    fn park(&self) -> Parked<T, E> {
        let parked: Parked<T, E> = Arc::new((Mutex::new(None), Condvar::new()));
        let on_fulfill = Arc::clone(&parked);
        let on_reject = Arc::clone(&parked);
        self.subscribe(
            move |value| {
                let (slot, condvar) = &*on_fulfill;
                *slot.lock() = Some(Ok(value));
                condvar.notify_all();
            },
            move |failure| {
                let (slot, condvar) = &*on_reject;
                *slot.lock() = Some(Err(failure));
                condvar.notify_all();
            },
        );
        parked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_returns_cross_thread_settlement() {
        let promise = Promise::<u32, &str>::new();
        let worker = promise.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            worker.fulfill(12);
        });
        assert_eq!(promise.wait(), Ok(12));
        handle.join().expect("worker thread panicked");
    }

    #[test]
    fn wait_returns_immediately_when_settled() {
        let promise = Promise::<u32, &str>::rejected("done");
        assert_eq!(promise.wait(), Err("done"));
    }

    #[test]
    fn wait_timeout_times_out_on_pending() {
        let promise = Promise::<u32, &str>::new();
        assert_eq!(promise.wait_timeout(Duration::from_millis(10)), None);
        // Consume the parked subscriber before dropping.
        promise.fulfill(0);
    }

    #[test]
    fn wait_timeout_returns_settlement_in_time() {
        let promise = Promise::<u32, &str>::new();
        let worker = promise.clone();
        let handle = thread::spawn(move || worker.fulfill(3));
        assert_eq!(promise.wait_timeout(Duration::from_secs(5)), Some(Ok(3)));
        handle.join().expect("worker thread panicked");
    }
}
