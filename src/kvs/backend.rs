//! File layout and checksummed, atomic document I/O.
//!
//! Files for instance `<id>` live side by side in one directory:
//!
//! - `kvs_<id>_0.json` / `.hash`: working document
//! - `kvs_<id>_<n>.json` / `.hash`: snapshot `n` (n >= 1)
//! - `kvs_<id>_default.json` / `.hash`: defaults document (never written here)

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::checksum;
use crate::error::{KvsError, Result};
use crate::format;
use crate::logging::{error, trace, warn};
use crate::value::KvsMap;

use super::types::{InstanceId, SnapshotId};

const DOCUMENT_EXT: &str = "json";
const HASH_EXT: &str = "hash";

/// One checksummed document of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Document {
    Working,
    Snapshot(SnapshotId),
    Defaults,
}

impl Document {
    fn slot(self) -> String {
        match self {
            Self::Working => SnapshotId::WORKING.to_string(),
            Self::Snapshot(id) => id.to_string(),
            Self::Defaults => "default".to_string(),
        }
    }
}

/// Reads and writes the JSON documents of one instance.
#[derive(Debug, Clone)]
pub(crate) struct JsonBackend {
    dir: PathBuf,
    instance_id: InstanceId,
}

impl JsonBackend {
    pub(crate) fn new(dir: PathBuf, instance_id: InstanceId) -> Self {
        Self { dir, instance_id }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn document_path(&self, doc: Document) -> PathBuf {
        self.path_with_ext(doc, DOCUMENT_EXT)
    }

    pub(crate) fn hash_path(&self, doc: Document) -> PathBuf {
        self.path_with_ext(doc, HASH_EXT)
    }

    pub(crate) fn exists(&self, doc: Document) -> bool {
        self.document_path(doc).is_file()
    }

    /// Read a document, verify it against its sidecar and decode it.
    pub(crate) fn load(&self, doc: Document) -> Result<KvsMap> {
        let doc_path = self.document_path(doc);
        let hash_path = self.hash_path(doc);

        let content = read_or(&doc_path, || KvsError::FileNotFound(doc_path.clone()))?;
        let sidecar = read_or(&hash_path, || KvsError::MissingChecksum(hash_path.clone()))?;
        checksum::verify(&doc_path, &content, &sidecar)?;

        let map = format::from_document(&content)?;
        trace!(path = %doc_path.display(), keys = map.len(), "loaded document");
        Ok(map)
    }

    /// Make `bytes` and their checksum visible under `doc`'s names.
    ///
    /// Both files are fully written and synced under temporary names first;
    /// the final names only ever point at complete files. The document is
    /// renamed before the sidecar. If the sidecar cannot be renamed the
    /// previous document is put back, so an error leaves the old pair as it
    /// was.
    pub(crate) fn publish(&self, doc: Document, bytes: &[u8]) -> Result<()> {
        let doc_path = self.document_path(doc);
        let sum = checksum::adler32(bytes);
        let staged_doc = self.stage(bytes)?;
        let staged_hash = self.stage(&checksum::encode(sum))?;
        let previous = read_if_file(&doc_path)?;

        staged_doc.persist(&doc_path).map_err(|e| e.error)?;
        if let Err(e) = staged_hash.persist(self.hash_path(doc)) {
            self.roll_back_document(doc, previous);
            return Err(e.error.into());
        }
        self.sync_dir();

        trace!(doc = ?doc, bytes = bytes.len(), checksum = sum, "published document");
        Ok(())
    }

    /// Delete a document and its sidecar. Missing files are not an error.
    ///
    /// The sidecar goes first: if only it was removed, the lone document
    /// fails verification instead of passing with a stale checksum.
    pub(crate) fn remove(&self, doc: Document) -> Result<()> {
        remove_if_present(&self.hash_path(doc))?;
        remove_if_present(&self.document_path(doc))?;
        Ok(())
    }

    /// Snapshot ids that have both a document and a sidecar on disk, ascending.
    pub(crate) fn snapshot_ids(&self) -> Result<Vec<SnapshotId>> {
        let prefix = format!("kvs_{}_", self.instance_id);
        let suffix = format!(".{}", DOCUMENT_EXT);
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(slot) = name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str()))
            else {
                continue;
            };
            // Rejects "default" and anything with a sign or padding.
            if slot.is_empty() || !slot.bytes().all(|b| b.is_ascii_digit()) || slot.starts_with('0')
            {
                continue;
            }
            let Ok(n) = slot.parse::<usize>() else {
                continue;
            };

            let id = SnapshotId(n);
            if self.hash_path(Document::Snapshot(id)).is_file() {
                ids.push(id);
            } else {
                warn!(snapshot = %id, "snapshot document without checksum ignored");
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }

    fn path_with_ext(&self, doc: Document, ext: &str) -> PathBuf {
        self.dir
            .join(format!("kvs_{}_{}.{}", self.instance_id, doc.slot(), ext))
    }

    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(".kvs_")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        Ok(file)
    }

    /// Restore `doc`'s content to `previous` after a failed publish, or
    /// delete it when there was none.
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn roll_back_document(&self, doc: Document, previous: Option<Vec<u8>>) {
        let doc_path = self.document_path(doc);
        let restored = match previous {
            Some(old) => self.stage(&old).and_then(|staged| {
                staged
                    .persist(&doc_path)
                    .map(|_| ())
                    .map_err(|e| KvsError::from(e.error))
            }),
            None => remove_if_present(&doc_path),
        };
        match restored {
            Ok(()) => warn!(doc = ?doc, "publish failed, previous document restored"),
            Err(e) => error!(doc = ?doc, error = %e, "publish failed and previous document could not be restored"),
        }
    }

    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn sync_dir(&self) {
        // Directory handles cannot be opened on every platform.
        let Ok(dir) = File::open(&self.dir) else {
            return;
        };
        if let Err(e) = dir.sync_all() {
            warn!(dir = %self.dir.display(), error = %e, "failed to sync directory");
        }
    }
}

fn read_or(path: &Path, missing: impl FnOnce() -> KvsError) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(missing()),
        Err(e) => Err(e.into()),
    }
}

/// Current content of a regular file, `None` if there is no such file.
fn read_if_file(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(fs::read(path)?))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::KvsValue;
    use tempfile::TempDir;

    fn backend(tmp: &TempDir) -> JsonBackend {
        JsonBackend::new(tmp.path().to_path_buf(), InstanceId(7))
    }

    #[test]
    fn test_file_names() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);
        assert_eq!(
            backend.document_path(Document::Working),
            tmp.path().join("kvs_7_0.json")
        );
        assert_eq!(
            backend.hash_path(Document::Snapshot(SnapshotId(3))),
            tmp.path().join("kvs_7_3.hash")
        );
        assert_eq!(
            backend.document_path(Document::Defaults),
            tmp.path().join("kvs_7_default.json")
        );
    }

    #[test]
    fn test_publish_then_load() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);

        let mut map = KvsMap::new();
        map.insert("answer".to_string(), KvsValue::U32(42));
        let bytes = format::to_document(&map).unwrap();
        backend.publish(Document::Working, &bytes).unwrap();

        assert_eq!(backend.load(Document::Working).unwrap(), map);
        let sidecar = fs::read(backend.hash_path(Document::Working)).unwrap();
        assert_eq!(sidecar, checksum::encode(checksum::adler32(&bytes)));

        // No temporary files are left behind.
        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_load_reports_missing_files() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);

        let err = backend.load(Document::Working).unwrap_err();
        assert!(matches!(err, KvsError::FileNotFound(_)));

        fs::write(backend.document_path(Document::Working), b"{}").unwrap();
        let err = backend.load(Document::Working).unwrap_err();
        assert!(matches!(err, KvsError::MissingChecksum(_)));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_snapshot_ids_scan() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);

        for id in [3, 1, 12] {
            backend
                .publish(Document::Snapshot(SnapshotId(id)), b"{}")
                .unwrap();
        }
        backend.publish(Document::Working, b"{}").unwrap();
        // Foreign or incomplete files are skipped.
        fs::write(tmp.path().join("kvs_7_5.json"), b"{}").unwrap();
        fs::write(tmp.path().join("kvs_8_2.json"), b"{}").unwrap();
        fs::write(tmp.path().join("kvs_8_2.hash"), b"1234").unwrap();
        fs::write(tmp.path().join("kvs_7_default.json"), b"{}").unwrap();
        fs::write(tmp.path().join("kvs_7_default.hash"), b"1234").unwrap();

        assert_eq!(
            backend.snapshot_ids().unwrap(),
            vec![SnapshotId(1), SnapshotId(3), SnapshotId(12)]
        );
    }

    /// Put a non-empty directory where a sidecar would go, so renaming a
    /// file onto it fails.
    fn block_path(path: &Path) {
        let _ = fs::remove_file(path);
        fs::create_dir(path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();
    }

    #[test]
    fn test_failed_sidecar_rename_restores_previous_document() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);
        let old = br#"{ "version": { "t": "i32", "v": 1 } }"#;
        backend.publish(Document::Working, old).unwrap();
        block_path(&backend.hash_path(Document::Working));

        let new = br#"{ "version": { "t": "i32", "v": 2 } }"#;
        let err = backend.publish(Document::Working, new).unwrap_err();
        assert!(err.is_io());
        assert_eq!(
            fs::read(backend.document_path(Document::Working)).unwrap(),
            old.to_vec()
        );

        let leftovers = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_failed_sidecar_rename_removes_new_document() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);
        let doc = Document::Snapshot(SnapshotId(4));
        block_path(&backend.hash_path(doc));

        assert!(backend.publish(doc, b"{}").is_err());
        assert!(!backend.document_path(doc).exists());
    }

    #[test]
    fn test_remove_keeps_document_when_sidecar_cannot_be_deleted() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);
        backend.publish(Document::Working, b"{}").unwrap();
        block_path(&backend.hash_path(Document::Working));

        assert!(backend.remove(Document::Working).is_err());
        assert!(backend.exists(Document::Working));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let backend = backend(&tmp);
        backend.publish(Document::Working, b"{}").unwrap();
        backend.remove(Document::Working).unwrap();
        assert!(!backend.exists(Document::Working));
        assert!(!backend.hash_path(Document::Working).exists());
        backend.remove(Document::Working).unwrap();
    }
}
