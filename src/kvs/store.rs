//! The key-value store.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{KvsError, Result};
use crate::format;
use crate::logging::{debug, info, trace, warn};
use crate::value::{KvsMap, KvsValue};

use super::backend::{Document, JsonBackend};
use super::builder::KvsOptions;
use super::defaults::DefaultsTable;
use super::snapshot::SnapshotManager;
use super::types::{InstanceId, KvsLoad, SnapshotId};

/// Mutable part of a store, guarded by one lock.
#[derive(Debug)]
struct KvsState {
    /// Values set explicitly since the last reset.
    overrides: KvsMap,
    snapshots: SnapshotManager,
    /// Set when `overrides` may differ from the working document.
    dirty: bool,
}

/// A typed key-value store persisted as checksummed JSON documents.
///
/// Reads take a shared lock and may run concurrently; every mutation takes
/// the lock exclusively. Nothing is written to disk except by [`Kvs::flush`]
/// and [`Kvs::reset`].
#[derive(Debug)]
pub struct Kvs {
    instance_id: InstanceId,
    backend: JsonBackend,
    defaults: DefaultsTable,
    state: RwLock<KvsState>,
}

impl Kvs {
    /// Open a store from validated options.
    ///
    /// Fails with the first fatal problem found: invalid options, a required
    /// working document that is missing or does not verify, or required
    /// defaults that are missing or do not verify.
    pub fn open(options: KvsOptions) -> Result<Self> {
        options.validate()?;

        let backend = JsonBackend::new(options.dir.clone(), options.instance_id);
        let (overrides, loaded) = load_working(&backend, options.kvs_load)?;
        let defaults = DefaultsTable::load(&backend, options.defaults)?;
        let snapshots = SnapshotManager::discover(&backend, options.snapshot_max_count)?;

        info!(
            instance = %options.instance_id,
            dir = %options.dir.display(),
            keys = overrides.len(),
            snapshots = snapshots.count(),
            "opened store"
        );

        Ok(Self {
            instance_id: options.instance_id,
            backend,
            defaults,
            state: RwLock::new(KvsState {
                overrides,
                snapshots,
                dirty: !loaded,
            }),
        })
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn dir(&self) -> &Path {
        self.backend.dir()
    }

    /// Insert or overwrite a value. A key may change kind between writes.
    pub fn set_value(&self, key: impl Into<String>, value: impl Into<KvsValue>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        debug!(key = %key, kind = %value.kind(), "set value");

        let mut state = self.state.write();
        state.overrides.insert(key, value);
        state.dirty = true;
        Ok(())
    }

    /// Read a value: the override if set, else the default.
    pub fn get_value(&self, key: &str) -> Result<KvsValue> {
        trace!(key, "get value");
        let state = self.state.read();
        state
            .overrides
            .get(key)
            .or_else(|| self.defaults.get(key))
            .cloned()
            .ok_or_else(|| KvsError::KeyNotFound(key.to_string()))
    }

    /// Read a value and convert it to `T`, failing with `TypeMismatch` when
    /// the stored kind does not match.
    pub fn get_value_as<T>(&self, key: &str) -> Result<T>
    where
        T: for<'a> TryFrom<&'a KvsValue, Error = KvsError>,
    {
        let value = self.get_value(key)?;
        T::try_from(&value)
    }

    /// Read a key from the defaults table only.
    pub fn get_default_value(&self, key: &str) -> Result<KvsValue> {
        self.defaults
            .get(key)
            .cloned()
            .ok_or_else(|| KvsError::KeyNotFound(key.to_string()))
    }

    /// Whether the key has been set explicitly. Defaults are not consulted.
    pub fn key_exists(&self, key: &str) -> Result<bool> {
        Ok(self.state.read().overrides.contains_key(key))
    }

    /// Whether a read of `key` is served by the defaults table.
    ///
    /// An override that happens to equal the default still counts as an
    /// override.
    pub fn is_value_default(&self, key: &str) -> Result<bool> {
        if !self.defaults.contains_key(key) {
            return Err(KvsError::KeyNotFound(key.to_string()));
        }
        Ok(!self.state.read().overrides.contains_key(key))
    }

    /// Every readable key: overrides in insertion order, then default-only
    /// keys in defaults order.
    pub fn get_all_keys(&self) -> Result<Vec<String>> {
        let state = self.state.read();
        let mut keys: Vec<String> = state.overrides.keys().cloned().collect();
        keys.extend(
            self.defaults
                .keys()
                .filter(|key| !state.overrides.contains_key(key.as_str()))
                .cloned(),
        );
        Ok(keys)
    }

    /// Delete an override. Fails if the key was never set, even when a
    /// default exists.
    pub fn remove_key(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.overrides.shift_remove(key).is_none() {
            return Err(KvsError::KeyNotFound(key.to_string()));
        }
        state.dirty = true;
        debug!(key, "removed key");
        Ok(())
    }

    /// Drop the override for `key` so reads fall back to the default.
    /// Succeeds whether or not an override existed.
    pub fn reset_key(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.overrides.shift_remove(key).is_some() {
            state.dirty = true;
            debug!(key, "reset key to default");
        }
        Ok(())
    }

    /// Drop every override and delete the working document. Snapshots and
    /// defaults are kept.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.write();
        self.backend.remove(Document::Working)?;
        info!(instance = %self.instance_id, cleared = state.overrides.len(), "reset store");
        state.overrides.clear();
        state.dirty = true;
        Ok(())
    }

    /// Persist the overrides and record a new snapshot.
    ///
    /// Does nothing when no mutation happened since the last load or flush
    /// and the working document is still on disk. On failure the documents
    /// on disk and the in-memory state are as they were before the call.
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        if !state.dirty && self.backend.exists(Document::Working) {
            debug!(instance = %self.instance_id, "flush skipped, nothing changed");
            return Ok(());
        }

        let bytes = format::to_document(&state.overrides)?;
        let id = state.snapshots.next_id()?;

        // The snapshot goes first: it only adds new files, so failing here
        // leaves every existing document alone.
        self.backend.publish(Document::Snapshot(id), &bytes)?;
        if let Err(e) = self.backend.publish(Document::Working, &bytes) {
            if let Err(cleanup) = self.backend.remove(Document::Snapshot(id)) {
                warn!(snapshot = %id, error = %cleanup, "failed to remove orphaned snapshot");
            }
            return Err(e);
        }

        state.snapshots.commit(&self.backend, id);
        state.dirty = false;
        info!(
            instance = %self.instance_id,
            snapshot = %id,
            keys = state.overrides.len(),
            bytes = bytes.len(),
            "flushed store"
        );
        Ok(())
    }

    /// Number of retained snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.state.read().snapshots.count()
    }

    /// Upper bound on retained snapshots.
    pub fn snapshot_max_count(&self) -> usize {
        self.state.read().snapshots.max_count()
    }

    /// Retained snapshot ids, oldest first.
    pub fn snapshot_ids(&self) -> Vec<SnapshotId> {
        self.state.read().snapshots.ids()
    }

    /// Replace all overrides with the contents of a retained snapshot.
    ///
    /// The snapshot is verified before anything changes; on failure the live
    /// overrides are untouched. Nothing is written until the next flush.
    pub fn snapshot_restore(&self, id: SnapshotId) -> Result<()> {
        let mut state = self.state.write();
        let restored = state.snapshots.load(&self.backend, id)?;
        info!(instance = %self.instance_id, snapshot = %id, keys = restored.len(), "restored snapshot");
        state.overrides = restored;
        state.dirty = true;
        Ok(())
    }

    /// Path of the document for a snapshot id, `SnapshotId(0)` being the
    /// working document.
    pub fn get_kvs_filename(&self, id: SnapshotId) -> Result<PathBuf> {
        self.check_slot(id)
            .map(|doc| self.backend.document_path(doc))
    }

    /// Path of the checksum sidecar for a snapshot id.
    pub fn get_hash_filename(&self, id: SnapshotId) -> Result<PathBuf> {
        self.check_slot(id).map(|doc| self.backend.hash_path(doc))
    }

    fn check_slot(&self, id: SnapshotId) -> Result<Document> {
        if id == SnapshotId::WORKING {
            return Ok(Document::Working);
        }
        if self.state.read().snapshots.contains(id) {
            Ok(Document::Snapshot(id))
        } else {
            Err(KvsError::SnapshotNotFound(id))
        }
    }
}

/// Returns the initial overrides and whether they came from disk.
#[cfg_attr(not(feature = "logging"), allow(unused_variables))]
fn load_working(backend: &JsonBackend, mode: KvsLoad) -> Result<(KvsMap, bool)> {
    match mode {
        KvsLoad::Ignored => Ok((KvsMap::new(), false)),
        KvsLoad::Required => Ok((backend.load(Document::Working)?, true)),
        KvsLoad::Optional if !backend.exists(Document::Working) => Ok((KvsMap::new(), false)),
        KvsLoad::Optional => match backend.load(Document::Working) {
            Ok(map) => Ok((map, true)),
            Err(e) => {
                warn!(error = %e, "working document unusable, starting empty");
                Ok((KvsMap::new(), false))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvs::KvsBuilder;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> Kvs {
        KvsBuilder::new(InstanceId(1))
            .dir(tmp.path())
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_get_overwrite_with_new_kind() {
        let tmp = TempDir::new().unwrap();
        let kvs = open(&tmp);

        kvs.set_value("temperature", 23i32).unwrap();
        assert_eq!(kvs.get_value("temperature").unwrap(), KvsValue::I32(23));

        kvs.set_value("temperature", "warm").unwrap();
        assert_eq!(kvs.get_value_as::<String>("temperature").unwrap(), "warm");
        assert!(kvs.get_value_as::<i32>("temperature").unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_remove_missing_key() {
        let tmp = TempDir::new().unwrap();
        let kvs = open(&tmp);
        assert!(kvs.remove_key("ghost").unwrap_err().is_not_found());
        assert!(kvs.get_value("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_keys_keep_insertion_order_after_remove() {
        let tmp = TempDir::new().unwrap();
        let kvs = open(&tmp);
        for key in ["c", "a", "b"] {
            kvs.set_value(key, true).unwrap();
        }
        kvs.remove_key("a").unwrap();
        assert_eq!(kvs.get_all_keys().unwrap(), ["c", "b"]);
    }

    #[test]
    fn test_flush_without_changes_is_noop() {
        let tmp = TempDir::new().unwrap();
        let kvs = open(&tmp);
        kvs.set_value("version", 1i32).unwrap();
        kvs.flush().unwrap();
        let first = std::fs::read(kvs.get_kvs_filename(SnapshotId(0)).unwrap()).unwrap();

        kvs.flush().unwrap();
        let second = std::fs::read(kvs.get_kvs_filename(SnapshotId(0)).unwrap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(kvs.snapshot_ids(), vec![SnapshotId(1)]);
    }

    #[test]
    fn test_filenames_for_unknown_snapshot() {
        let tmp = TempDir::new().unwrap();
        let kvs = open(&tmp);
        assert_eq!(
            kvs.get_hash_filename(SnapshotId(0)).unwrap(),
            tmp.path().join("kvs_1_0.hash")
        );
        assert!(kvs.get_kvs_filename(SnapshotId(1)).unwrap_err().is_not_found());
    }
}
