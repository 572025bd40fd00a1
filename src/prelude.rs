//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use rust_kvs::prelude::*;
//!
//! let kvs = KvsBuilder::new(InstanceId(1)).dir("./data").build()?;
//! kvs.set_value("temperature", 23i32)?;
//! kvs.flush()?;
//! ```

pub use crate::error::{ErrorKind, KvsError, Result};
pub use crate::kvs::{
    InstanceId, Kvs, KvsBuilder, KvsDefaults, KvsLoad, KvsOptions, SnapshotId,
};
pub use crate::value::{KvsArray, KvsMap, KvsValue, KvsValueKind};

#[cfg(feature = "config")]
pub use crate::config::KvsConfig;
