//! Racing and synchronizing combinators.
//!
//! Two families:
//!
//! - **Merge (race)**: one child subscribed to every input with the same
//!   fulfill/reject pair. The child's settle-once transition is the only
//!   guard needed; whichever input settles first wins and every later
//!   sibling settlement is silently dropped.
//! - **Combine (zip)**: wait for all inputs to fulfill, short-circuiting on
//!   the first rejection. Zipping aggregates into external mutable state
//!   (per-input slots), so it carries its own lock; every decision is made
//!   under that lock and the child is settled only after releasing it.
//!
//! For [`combine_all`] the output order mirrors input index order, never
//! arrival order.

use crate::promise::Promise;
use parking_lot::Mutex;
use std::sync::Arc;

/// Slot state for zipping two promises of different output types.
struct Zip2<A, B> {
    left: Option<A>,
    right: Option<B>,
    completed: bool,
}

/// Index-keyed buffer for [`combine_all`].
struct Aggregate<T> {
    slots: Vec<Option<T>>,
    filled: usize,
    completed: bool,
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Settles with whichever of `self` or `other` settles first.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let child = Self::new();
        self.pipe(&child);
        other.pipe(&child);
        child
    }

    /// Zips `self` with `other`, waiting for both to fulfill.
    ///
    /// The first rejection among the inputs rejects the pair; a fulfillment
    /// arriving after that is ignored.
    #[must_use]
    pub fn combine<U>(&self, other: &Promise<U, E>) -> Promise<(T, U), E>
    where
        U: Clone + Send + 'static,
    {
        let child = Promise::new();
        let slots = Arc::new(Mutex::new(Zip2 {
            left: None,
            right: None,
            completed: false,
        }));

        let on_fulfill = child.clone();
        let on_slots = Arc::clone(&slots);
        self.subscribe(
            move |value| {
                let pair = {
                    let mut slots = on_slots.lock();
                    if slots.completed {
                        None
                    } else {
                        slots.left = Some(value);
                        if slots.right.is_some() {
                            slots.completed = true;
                            slots.left.take().zip(slots.right.take())
                        } else {
                            None
                        }
                    }
                };
                if let Some(pair) = pair {
                    on_fulfill.fulfill(pair);
                }
            },
            reject_once(child.clone(), Arc::clone(&slots)),
        );

        let on_fulfill = child.clone();
        let on_slots = Arc::clone(&slots);
        other.subscribe(
            move |value| {
                let pair = {
                    let mut slots = on_slots.lock();
                    if slots.completed {
                        None
                    } else {
                        slots.right = Some(value);
                        if slots.left.is_some() {
                            slots.completed = true;
                            slots.left.take().zip(slots.right.take())
                        } else {
                            None
                        }
                    }
                };
                if let Some(pair) = pair {
                    on_fulfill.fulfill(pair);
                }
            },
            reject_once(child.clone(), Arc::clone(&slots)),
        );

        child
    }
}

/// Builds the shared rejection arm for a zip: the first rejection wins the
/// completed flag and rejects the child outside the slot lock.
fn reject_once<A, B, T, E>(
    child: Promise<T, E>,
    slots: Arc<Mutex<Zip2<A, B>>>,
) -> impl FnOnce(E) + Send + 'static
where
    A: Send + 'static,
    B: Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    move |failure| {
        let fire = {
            let mut slots = slots.lock();
            if slots.completed {
                false
            } else {
                slots.completed = true;
                true
            }
        };
        if fire {
            child.reject(failure);
        }
    }
}

/// Zips three promises into a tuple.
#[must_use]
pub fn combine3<A, B, C, E>(
    a: &Promise<A, E>,
    b: &Promise<B, E>,
    c: &Promise<C, E>,
) -> Promise<(A, B, C), E>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    a.combine(b).combine(c).map(|((a, b), c)| (a, b, c))
}

/// Zips four promises into a tuple.
#[must_use]
pub fn combine4<A, B, C, D, E>(
    a: &Promise<A, E>,
    b: &Promise<B, E>,
    c: &Promise<C, E>,
    d: &Promise<D, E>,
) -> Promise<(A, B, C, D), E>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
    D: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    combine3(a, b, c)
        .combine(d)
        .map(|((a, b, c), d)| (a, b, c, d))
}

/// Settles with the first of `promises` to settle.
///
/// An empty input yields a promise that never settles.
#[must_use]
pub fn merge_all<T, E, I>(promises: I) -> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let child = Promise::new();
    for promise in promises {
        promise.pipe(&child);
    }
    child
}

/// Zips all of `promises`, producing their outputs in input order.
///
/// Rejects as soon as any input rejects, regardless of how many
/// fulfillments have already arrived. An empty input fulfills immediately
/// with an empty collection.
#[must_use]
pub fn combine_all<T, E, I>(promises: I) -> Promise<Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let promises: Vec<Promise<T, E>> = promises.into_iter().collect();
    if promises.is_empty() {
        return Promise::fulfilled(Vec::new());
    }

    let count = promises.len();
    let child = Promise::new();
    let aggregate = Arc::new(Mutex::new(Aggregate {
        slots: (0..count).map(|_| None).collect(),
        filled: 0,
        completed: false,
    }));

    for (index, promise) in promises.iter().enumerate() {
        let on_fulfill = child.clone();
        let on_reject = child.clone();
        let fulfill_aggregate = Arc::clone(&aggregate);
        let reject_aggregate = Arc::clone(&aggregate);
        promise.subscribe(
            move |value| {
                let outputs = {
                    let mut aggregate = fulfill_aggregate.lock();
                    if aggregate.completed {
                        None
                    } else {
                        if aggregate.slots[index].is_none() {
                            aggregate.filled += 1;
                        }
                        aggregate.slots[index] = Some(value);
                        if aggregate.filled == count {
                            aggregate.completed = true;
                            Some(aggregate.slots.drain(..).flatten().collect::<Vec<_>>())
                        } else {
                            None
                        }
                    }
                };
                if let Some(outputs) = outputs {
                    on_fulfill.fulfill(outputs);
                }
            },
            move |failure| {
                let fire = {
                    let mut aggregate = reject_aggregate.lock();
                    if aggregate.completed {
                        false
                    } else {
                        aggregate.completed = true;
                        true
                    }
                };
                if fire {
                    on_reject.reject(failure);
                }
            },
        );
    }

    child
}
