//! Error type for every fallible store operation.
//!
//! All public operations return [`Result`]. The variants are fine grained so
//! callers get the offending path or key back; [`KvsError::kind`] folds them
//! into the six categories a caller usually branches on.

use std::path::PathBuf;

use thiserror::Error;

use crate::kvs::SnapshotId;
use crate::value::KvsValueKind;

/// Errors that can occur while building or operating a store.
#[derive(Error, Debug)]
pub enum KvsError {
    /// Builder options or a configuration document are invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document required at construction time does not exist.
    #[error("Required file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The stored checksum does not match the document content.
    #[error(
        "Checksum mismatch for {}: stored {stored:#010x}, computed {computed:#010x}",
        path.display()
    )]
    Corruption {
        path: PathBuf,
        stored: u32,
        computed: u32,
    },

    /// A document exists but its checksum sidecar does not.
    #[error("Checksum file missing: {}", .0.display())]
    MissingChecksum(PathBuf),

    /// The checksum sidecar does not hold exactly four bytes.
    #[error("Checksum file malformed ({len} bytes): {}", path.display())]
    MalformedChecksum { path: PathBuf, len: usize },

    /// A document is well-formed JSON but violates the tagged-value schema.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    /// The highest snapshot id on disk has no successor.
    #[error("Snapshot id {0} cannot be followed by another snapshot")]
    SnapshotIdExhausted(SnapshotId),

    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: KvsValueKind,
        actual: KvsValueKind,
    },
}

/// A [`Result`] type alias using [`KvsError`].
pub type Result<T> = std::result::Result<T, KvsError>;

/// Coarse classification of a [`KvsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Io,
    Corruption,
    Parse,
    NotFound,
    TypeMismatch,
}

impl KvsError {
    /// Create a schema parse error from a message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error from a message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn type_mismatch(expected: KvsValueKind, actual: KvsValueKind) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::FileNotFound(_) => ErrorKind::Io,
            Self::Corruption { .. }
            | Self::MissingChecksum(_)
            | Self::MalformedChecksum { .. }
            | Self::SnapshotIdExhausted(_) => ErrorKind::Corruption,
            Self::Parse(_) | Self::Json(_) => ErrorKind::Parse,
            Self::KeyNotFound(_) | Self::SnapshotNotFound(_) => ErrorKind::NotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }

    /// Returns `true` if the error means the stored data cannot be trusted.
    pub fn is_corruption(&self) -> bool {
        self.kind() == ErrorKind::Corruption
    }

    /// Returns `true` if a key or snapshot id was absent.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns `true` if a document could not be decoded.
    pub fn is_parse(&self) -> bool {
        self.kind() == ErrorKind::Parse
    }

    pub fn is_io(&self) -> bool {
        self.kind() == ErrorKind::Io
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn is_type_mismatch(&self) -> bool {
        self.kind() == ErrorKind::TypeMismatch
    }
}
