//! Tracing compatibility layer for structured logging.
//!
//! Provides the logging macros used at settlement trace points whether or
//! not the `tracing-integration` feature is enabled:
//!
//! - **With feature enabled**: re-exports from the `tracing` crate.
//! - **Without feature**: no-op macros that compile to nothing.
//!
//! Enable tracing by adding the feature to your `Cargo.toml`:
//!
//! ```toml
//! promissory = { version = "0.2", features = ["tracing-integration"] }
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, trace};

// When tracing is disabled, provide no-op macros.
#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op implementations when tracing is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    // Re-export the macros at module level.
    pub use crate::{debug, trace};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;
