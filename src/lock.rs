//! Re-entrant lock guarding promise state.
//!
//! Settlement callbacks run user code that routinely calls back into the
//! library (chaining a combinator, subscribing again, settling another
//! promise). The lock protecting `(state, subscribers)` therefore must never
//! deadlock when the owning thread re-acquires it. `ReentrantLock` builds on
//! `parking_lot::ReentrantMutex`, which parks other threads but lets the
//! owner re-enter freely.
//!
//! Critical sections must not nest: the interior `RefCell` hands out one
//! mutable borrow at a time. The settlement paths uphold this by draining
//! state inside [`ReentrantLock::with`] and invoking callbacks only after the
//! closure has returned.

use parking_lot::ReentrantMutex;
use std::cell::RefCell;

/// A mutual-exclusion lock usable recursively from the owning thread.
pub(crate) struct ReentrantLock<T> {
    inner: ReentrantMutex<RefCell<T>>,
}

impl<T> ReentrantLock<T> {
    /// Creates a lock wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(value)),
        }
    }

    /// Runs `f` with exclusive access to the guarded value.
    ///
    /// Re-acquiring from the same thread after `f` returns is always safe;
    /// other threads block until the critical section ends.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let guard = self.inner.lock();
        let mut value = guard.borrow_mut();
        f(&mut value)
    }
}
