//! Crate-internal logging macros.
//!
//! With the `logging` feature the macros forward to `tracing` and accept the
//! full `tracing` field syntax. Without it they expand to `()`, which is
//! valid both as a statement and in expression position such as a match arm.
//!
//! ```rust,ignore
//! use crate::logging::{debug, info};
//!
//! info!(instance = %id, dir = %dir.display(), "opened store");
//! debug!(key, "value set");
//! ```

/// Per-read and checksum detail.
#[cfg(feature = "logging")]
macro_rules! kvs_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! kvs_trace {
    ($($arg:tt)*) => {
        ()
    };
}

/// Per-key mutations and skipped work.
#[cfg(feature = "logging")]
macro_rules! kvs_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! kvs_debug {
    ($($arg:tt)*) => {
        ()
    };
}

/// Store lifecycle: open, flush, reset, restore, eviction.
#[cfg(feature = "logging")]
macro_rules! kvs_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! kvs_info {
    ($($arg:tt)*) => {
        ()
    };
}

/// Degraded loads and failed best-effort cleanup.
#[cfg(feature = "logging")]
macro_rules! kvs_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! kvs_warn {
    ($($arg:tt)*) => {
        ()
    };
}

/// Emitted right before an integrity error is returned.
#[cfg(feature = "logging")]
macro_rules! kvs_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) }
}

#[cfg(not(feature = "logging"))]
macro_rules! kvs_error {
    ($($arg:tt)*) => {
        ()
    };
}

pub(crate) use kvs_debug as debug;
pub(crate) use kvs_error as error;
pub(crate) use kvs_info as info;
pub(crate) use kvs_trace as trace;
pub(crate) use kvs_warn as warn;
