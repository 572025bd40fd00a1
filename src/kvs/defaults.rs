//! Read-only defaults table.

use crate::error::Result;
use crate::logging::{debug, info, warn};
use crate::value::{KvsMap, KvsValue};

use super::backend::{Document, JsonBackend};
use super::types::KvsDefaults;

/// Fallback values consulted when a key has no override.
///
/// Loaded once during construction and never modified afterwards.
#[derive(Debug, Default)]
pub(crate) struct DefaultsTable {
    values: KvsMap,
}

impl DefaultsTable {
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    pub(crate) fn load(backend: &JsonBackend, mode: KvsDefaults) -> Result<Self> {
        let values = match mode {
            KvsDefaults::Ignored => KvsMap::new(),
            KvsDefaults::Required => backend.load(Document::Defaults)?,
            KvsDefaults::Optional if !backend.exists(Document::Defaults) => {
                debug!(dir = %backend.dir().display(), "no defaults document");
                KvsMap::new()
            }
            KvsDefaults::Optional => match backend.load(Document::Defaults) {
                Ok(values) => values,
                Err(e) => {
                    warn!(error = %e, "defaults document unusable, continuing without defaults");
                    KvsMap::new()
                }
            },
        };

        if !values.is_empty() {
            info!(keys = values.len(), "loaded defaults");
        }
        Ok(Self { values })
    }

    pub(crate) fn get(&self, key: &str) -> Option<&KvsValue> {
        self.values.get(key)
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in document order.
    pub(crate) fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;
    use crate::kvs::types::InstanceId;
    use std::fs;
    use tempfile::TempDir;

    fn write_defaults(backend: &JsonBackend) {
        let doc = br#"{ "theme": { "t": "str", "v": "dark" }, "timeout": { "t": "i32", "v": 30 } }"#;
        backend.publish(Document::Defaults, doc).unwrap();
    }

    #[test]
    fn test_ignored_never_reads() {
        let tmp = TempDir::new().unwrap();
        let backend = JsonBackend::new(tmp.path().to_path_buf(), InstanceId(1));
        write_defaults(&backend);
        let table = DefaultsTable::load(&backend, KvsDefaults::Ignored).unwrap();
        assert!(table.get("theme").is_none());
    }

    #[test]
    fn test_required_loads_in_document_order() {
        let tmp = TempDir::new().unwrap();
        let backend = JsonBackend::new(tmp.path().to_path_buf(), InstanceId(1));
        write_defaults(&backend);

        let table = DefaultsTable::load(&backend, KvsDefaults::Required).unwrap();
        let keys: Vec<&String> = table.keys().collect();
        assert_eq!(keys, ["theme", "timeout"]);
        assert_eq!(table.get("timeout"), Some(&KvsValue::I32(30)));
        assert!(table.contains_key("theme"));
    }

    #[test]
    fn test_corrupt_defaults_by_mode() {
        let tmp = TempDir::new().unwrap();
        let backend = JsonBackend::new(tmp.path().to_path_buf(), InstanceId(1));
        write_defaults(&backend);

        let hash_path = backend.hash_path(Document::Defaults);
        let mut sidecar = fs::read(&hash_path).unwrap();
        sidecar[2] ^= 0xff;
        fs::write(&hash_path, sidecar).unwrap();

        let err = DefaultsTable::load(&backend, KvsDefaults::Required).unwrap_err();
        assert!(err.is_corruption());

        let table = DefaultsTable::load(&backend, KvsDefaults::Optional).unwrap();
        assert!(table.keys().next().is_none());
    }

    #[test]
    fn test_missing_sidecar_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let backend = JsonBackend::new(tmp.path().to_path_buf(), InstanceId(1));
        let bytes = format::to_document(&KvsMap::new()).unwrap();
        fs::write(backend.document_path(Document::Defaults), bytes).unwrap();

        let err = DefaultsTable::load(&backend, KvsDefaults::Required).unwrap_err();
        assert!(err.is_corruption());
    }
}
