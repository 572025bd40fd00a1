//! Persistent key-value store with a defaults overlay and snapshot history.
//!
//! A [`Kvs`] keeps explicitly set values in memory and writes them to a
//! checksummed JSON working document on [`Kvs::flush`]. Every flush also
//! leaves a numbered snapshot behind, of which a bounded number is retained
//! and can be restored. An optional read-only defaults document answers
//! reads for keys that were never set.

mod backend;
mod builder;
mod defaults;
mod snapshot;
mod store;
mod types;

pub use builder::{KvsBuilder, KvsOptions};
pub use snapshot::DEFAULT_SNAPSHOT_MAX_COUNT;
pub use store::Kvs;
pub use types::{InstanceId, KvsDefaults, KvsLoad, SnapshotId};
