//! Validated store construction.

use std::path::PathBuf;

use crate::error::{KvsError, Result};

use super::snapshot::DEFAULT_SNAPSHOT_MAX_COUNT;
use super::store::Kvs;
use super::types::{InstanceId, KvsDefaults, KvsLoad};

/// Everything needed to open a [`Kvs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvsOptions {
    pub instance_id: InstanceId,
    /// Directory holding this instance's documents. Must already exist.
    pub dir: PathBuf,
    pub kvs_load: KvsLoad,
    pub defaults: KvsDefaults,
    /// Upper bound on retained snapshots, at least 1.
    pub snapshot_max_count: usize,
}

impl KvsOptions {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            dir: PathBuf::from("."),
            kvs_load: KvsLoad::default(),
            defaults: KvsDefaults::default(),
            snapshot_max_count: DEFAULT_SNAPSHOT_MAX_COUNT,
        }
    }

    /// Check the options without touching any document.
    pub fn validate(&self) -> Result<()> {
        if self.dir.as_os_str().is_empty() {
            return Err(KvsError::configuration("directory must not be empty"));
        }
        if !self.dir.is_dir() {
            return Err(KvsError::configuration(format!(
                "'{}' is not an existing directory",
                self.dir.display()
            )));
        }
        if self.snapshot_max_count == 0 {
            return Err(KvsError::configuration(
                "snapshot_max_count must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Chainable front end for [`KvsOptions`].
///
/// ```ignore
/// use rust_kvs::prelude::*;
///
/// let kvs = KvsBuilder::new(InstanceId(1))
///     .dir("./data")
///     .kvs_load(KvsLoad::Optional)
///     .defaults(KvsDefaults::Required)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct KvsBuilder {
    options: KvsOptions,
}

impl KvsBuilder {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            options: KvsOptions::new(instance_id),
        }
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.dir = dir.into();
        self
    }

    pub fn kvs_load(mut self, kvs_load: KvsLoad) -> Self {
        self.options.kvs_load = kvs_load;
        self
    }

    pub fn defaults(mut self, defaults: KvsDefaults) -> Self {
        self.options.defaults = defaults;
        self
    }

    pub fn snapshot_max_count(mut self, max: usize) -> Self {
        self.options.snapshot_max_count = max;
        self
    }

    pub fn options(&self) -> &KvsOptions {
        &self.options
    }

    pub fn into_options(self) -> KvsOptions {
        self.options
    }

    /// Validate the options and open the store.
    pub fn build(self) -> Result<Kvs> {
        Kvs::open(self.options)
    }
}

impl From<KvsOptions> for KvsBuilder {
    fn from(options: KvsOptions) -> Self {
        Self { options }
    }
}
