//! Store configuration loaded from TOML.
//!
//! ```toml
//! instance_id = 1
//! dir = "/var/lib/app/kvs"
//! kvs_load = "required"
//! defaults = "optional"
//! snapshot_max_count = 5
//! ```
//!
//! Only `instance_id` is mandatory; the rest fall back to the same values as
//! [`KvsBuilder::new`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{KvsError, Result};
use crate::kvs::{
    DEFAULT_SNAPSHOT_MAX_COUNT, InstanceId, Kvs, KvsBuilder, KvsDefaults, KvsLoad, KvsOptions,
};

/// Store configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KvsConfig {
    pub instance_id: InstanceId,
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub kvs_load: KvsLoad,
    #[serde(default)]
    pub defaults: KvsDefaults,
    #[serde(default = "default_snapshot_max_count")]
    pub snapshot_max_count: usize,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_snapshot_max_count() -> usize {
    DEFAULT_SNAPSHOT_MAX_COUNT
}

impl KvsConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            KvsError::configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| KvsError::configuration(format!("failed to parse config: {}", e)))
    }

    pub fn to_options(&self) -> KvsOptions {
        KvsOptions {
            instance_id: self.instance_id,
            dir: self.dir.clone(),
            kvs_load: self.kvs_load,
            defaults: self.defaults,
            snapshot_max_count: self.snapshot_max_count,
        }
    }

    pub fn into_builder(self) -> KvsBuilder {
        KvsBuilder::from(self.to_options())
    }

    /// Open the store this configuration describes.
    pub fn open(&self) -> Result<Kvs> {
        Kvs::open(self.to_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
instance_id = 3
dir = "/var/lib/kvs"
kvs_load = "required"
defaults = "optional"
snapshot_max_count = 5
"#;
        let config = KvsConfig::from_str(toml).unwrap();
        assert_eq!(config.instance_id, InstanceId(3));
        assert_eq!(config.dir, PathBuf::from("/var/lib/kvs"));
        assert_eq!(config.kvs_load, KvsLoad::Required);
        assert_eq!(config.defaults, KvsDefaults::Optional);
        assert_eq!(config.snapshot_max_count, 5);
    }

    #[test]
    fn test_defaults_match_builder() {
        let config = KvsConfig::from_str("instance_id = 1").unwrap();
        assert_eq!(
            config.to_options(),
            KvsBuilder::new(InstanceId(1)).into_options()
        );
    }

    #[test]
    fn test_rejects_unknown_policy_and_fields() {
        let err = KvsConfig::from_str("instance_id = 1\nkvs_load = \"sometimes\"").unwrap_err();
        assert!(err.is_configuration());

        let err = KvsConfig::from_str("instance_id = 1\nmax = 2").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_file() {
        let err = KvsConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.is_configuration());
    }
}
