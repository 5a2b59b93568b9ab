//! Promissory: thread-safe single-settlement promises with a combinator algebra.
//!
//! # Overview
//!
//! A [`Promise<T, E>`](Promise) is a container for the eventual result of an
//! asynchronous operation. It settles exactly once — fulfilled with a value
//! or rejected with a failure — and delivers that result to any number of
//! subscribers exactly once each, whenever and on whatever thread they
//! attach. Everything else in the crate is algebra over that contract:
//! transformation, racing, zipping, bulk aggregation, timeout, and
//! cooperative cancellation.
//!
//! # Core Guarantees
//!
//! - **Settle-once**: the Pending → settled transition is monotonic; later
//!   settlement attempts are silent no-ops, not errors
//! - **Exactly-once delivery**: each subscriber observes the result exactly
//!   once, even when it attaches after settlement
//! - **Registration order**: subscribers attached while pending fire in
//!   registration order on the settling thread
//! - **No imposed scheduler**: callbacks run synchronously; the caller owns
//!   all scheduling decisions
//! - **Callback re-entrancy**: callbacks may chain, subscribe, and settle
//!   other promises without deadlocking
//!
//! # Module Structure
//!
//! - [`promise`]: the core state machine and subscription contract
//! - [`operators`]: map/and_then/map_err transformation family
//! - [`combine`]: merge (race) and combine (zip) algebra, N-ary variants
//! - [`timeout`]: deadline race and timer promises
//! - [`cancel`]: cooperative cancellation wiring
//! - [`abandon`]: split settlement capabilities with abandonment detection
//! - [`wait`](mod@wait): blocking escape hatch for thread-based callers
//! - [`tracing_compat`]: optional tracing integration (requires the
//!   `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use promissory::{Promise, combine_all};
//!
//! let parts: Vec<Promise<u32, &str>> = (0..3).map(|_| Promise::new()).collect();
//! let total = combine_all(parts.iter().cloned()).map(|outputs| outputs.iter().sum::<u32>());
//!
//! // Settlement order does not matter; output order follows input order.
//! parts[2].fulfill(30);
//! parts[0].fulfill(10);
//! parts[1].fulfill(20);
//!
//! assert_eq!(total.result(), Some(Ok(60)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]

pub mod abandon;
pub mod cancel;
pub mod combine;
mod lock;
pub mod operators;
pub mod promise;
pub mod timeout;
pub mod tracing_compat;
pub mod wait;

pub use abandon::{Rejector, Resolver, UnresolvedError};
pub use cancel::CancelError;
pub use combine::{combine3, combine4, combine_all, merge_all};
pub use operators::SharedError;
pub use promise::Promise;
pub use timeout::{TimedError, after};
