//! Identifiers and load policies for the store.

use std::fmt;

/// Identifies one logical store and its file namespace in a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(transparent))]
pub struct InstanceId(pub usize);

/// Identifies one retained snapshot. Ids start at 1 and only grow; id 0
/// names the working document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub usize);

impl SnapshotId {
    /// The working document's slot in the file layout.
    pub const WORKING: SnapshotId = SnapshotId(0);

    /// The following id, or `None` at `usize::MAX`.
    pub(crate) fn next(self) -> Option<SnapshotId> {
        self.0.checked_add(1).map(SnapshotId)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the working document is read at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum KvsLoad {
    /// Start empty; the next flush overwrites whatever is on disk.
    Ignored,
    /// Load when present. A missing document starts empty; a corrupt one is
    /// logged and skipped.
    #[default]
    Optional,
    /// The document must exist and verify, or construction fails.
    Required,
}

/// Whether the defaults document is read at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum KvsDefaults {
    /// No defaults table.
    #[default]
    Ignored,
    /// Load when present and valid, otherwise use an empty table.
    Optional,
    /// The defaults document must exist and verify, or construction fails.
    Required,
}
