//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_kvs::checksum;
use rust_kvs::prelude::*;
use tempfile::TempDir;

/// Defaults document used by the overlay tests, in the on-disk format.
pub const DEFAULTS_JSON: &str = r#"{
    "theme": { "t": "str", "v": "dark" },
    "language": { "t": "str", "v": "en" },
    "timeout": { "t": "i32", "v": 30 },
    "auto_save": { "t": "bool", "v": true },
    "max_connections": { "t": "i32", "v": 100 }
}"#;

/// Keys of [`DEFAULTS_JSON`] in document order.
pub const DEFAULT_KEYS: [&str; 5] = ["theme", "language", "timeout", "auto_save", "max_connections"];

pub fn kvs_path(dir: &Path, instance: usize, slot: &str) -> PathBuf {
    dir.join(format!("kvs_{}_{}.json", instance, slot))
}

pub fn hash_path(dir: &Path, instance: usize, slot: &str) -> PathBuf {
    dir.join(format!("kvs_{}_{}.hash", instance, slot))
}

/// Write a document and a matching checksum sidecar.
pub fn write_document(dir: &Path, instance: usize, slot: &str, json: &str) {
    fs::write(kvs_path(dir, instance, slot), json).unwrap();
    fs::write(
        hash_path(dir, instance, slot),
        checksum::encode(checksum::adler32(json.as_bytes())),
    )
    .unwrap();
}

pub fn write_defaults(dir: &Path, instance: usize) {
    write_document(dir, instance, "default", DEFAULTS_JSON);
}

/// Flip one bit of a checksum sidecar.
pub fn corrupt_hash(dir: &Path, instance: usize, slot: &str) {
    let path = hash_path(dir, instance, slot);
    let mut bytes = fs::read(&path).unwrap();
    bytes[0] ^= 0x01;
    fs::write(&path, bytes).unwrap();
}

/// Open instance `instance` in `tmp` with the given policies.
pub fn open(tmp: &TempDir, instance: usize, load: KvsLoad, defaults: KvsDefaults) -> Result<Kvs> {
    KvsBuilder::new(InstanceId(instance))
        .dir(tmp.path())
        .kvs_load(load)
        .defaults(defaults)
        .build()
}

/// Open with optional working document, no defaults and the given snapshot bound.
pub fn open_with_max(tmp: &TempDir, instance: usize, max: usize) -> Kvs {
    KvsBuilder::new(InstanceId(instance))
        .dir(tmp.path())
        .snapshot_max_count(max)
        .build()
        .unwrap()
}
