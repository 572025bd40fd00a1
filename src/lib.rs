//! A typed, persistent key-value store.
//!
//! Values are a closed set of kinds ([`KvsValue`]) and are persisted as JSON
//! documents in which every entry carries its type tag, so reads never guess
//! a type. Each document has an Adler-32 checksum sidecar that must match
//! before its content is trusted.
//!
//! # Quick Start
//!
//! ```ignore
//! use rust_kvs::prelude::*;
//!
//! let kvs = KvsBuilder::new(InstanceId(1))
//!     .dir("./data")
//!     .kvs_load(KvsLoad::Optional)
//!     .defaults(KvsDefaults::Optional)
//!     .build()?;
//!
//! kvs.set_value("version", 1i32)?;
//! kvs.flush()?;                          // writes kvs_1_0.json and snapshot 1
//!
//! kvs.set_value("version", 2i32)?;
//! kvs.flush()?;                          // snapshot 2
//!
//! kvs.snapshot_restore(SnapshotId(1))?;
//! assert_eq!(kvs.get_value_as::<i32>("version")?, 1);
//! ```
//!
//! # Modules
//!
//! - [`kvs`] - The store, its builder and snapshot history
//! - [`value`] - The value model
//! - [`format`] - Tagged JSON document encoding
//! - [`checksum`] - Adler-32 and sidecar encoding
//! - [`config`] - TOML configuration (requires `config` feature)
//!
//! # Feature Flags
//!
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `config` - Enable loading store options from TOML
//! - `full` - Enable all features

pub mod checksum;
#[cfg(feature = "config")]
pub mod config;
mod error;
pub mod format;
pub mod kvs;
mod logging;
pub mod prelude;
pub mod value;

pub use error::{ErrorKind, KvsError, Result};

pub use kvs::{InstanceId, Kvs, KvsBuilder, KvsDefaults, KvsLoad, KvsOptions, SnapshotId};
pub use value::{KvsArray, KvsMap, KvsValue, KvsValueKind};

#[cfg(feature = "config")]
pub use config::KvsConfig;
