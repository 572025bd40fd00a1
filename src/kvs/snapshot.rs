//! Bounded snapshot history.
//!
//! Each successful flush adds one snapshot whose id is one past the highest id
//! ever seen. When more than `max_count` snapshots are retained the lowest ids
//! are evicted first.

use std::collections::VecDeque;

use crate::error::{KvsError, Result};
use crate::logging::{info, warn};
use crate::value::KvsMap;

use super::backend::{Document, JsonBackend};
use super::types::SnapshotId;

/// Snapshots retained when no maximum is configured.
pub const DEFAULT_SNAPSHOT_MAX_COUNT: usize = 3;

#[derive(Debug)]
pub(crate) struct SnapshotManager {
    /// Retained ids, ascending.
    ids: VecDeque<SnapshotId>,
    last_id: SnapshotId,
    max_count: usize,
}

impl SnapshotManager {
    /// Adopt the snapshots already on disk, evicting any beyond `max_count`.
    pub(crate) fn discover(backend: &JsonBackend, max_count: usize) -> Result<Self> {
        let ids: VecDeque<SnapshotId> = backend.snapshot_ids()?.into();
        let last_id = ids.back().copied().unwrap_or(SnapshotId::WORKING);
        let mut manager = Self {
            ids,
            last_id,
            max_count,
        };

        if manager.count() > 0 {
            info!(count = manager.count(), last = %last_id, "found existing snapshots");
        }
        manager.evict_excess(backend);
        Ok(manager)
    }

    pub(crate) fn count(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn max_count(&self) -> usize {
        self.max_count
    }

    pub(crate) fn ids(&self) -> Vec<SnapshotId> {
        self.ids.iter().copied().collect()
    }

    pub(crate) fn contains(&self, id: SnapshotId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Id the next snapshot will be written under.
    pub(crate) fn next_id(&self) -> Result<SnapshotId> {
        self.last_id
            .next()
            .ok_or(KvsError::SnapshotIdExhausted(self.last_id))
    }

    /// Record a snapshot written under [`SnapshotManager::next_id`] and evict
    /// down to the bound.
    pub(crate) fn commit(&mut self, backend: &JsonBackend, id: SnapshotId) {
        self.ids.push_back(id);
        self.last_id = id;
        self.evict_excess(backend);
    }

    /// Load a retained snapshot's contents.
    pub(crate) fn load(&self, backend: &JsonBackend, id: SnapshotId) -> Result<KvsMap> {
        if !self.contains(id) {
            return Err(KvsError::SnapshotNotFound(id));
        }
        backend.load(Document::Snapshot(id))
    }

    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn evict_excess(&mut self, backend: &JsonBackend) {
        while self.ids.len() > self.max_count {
            let Some(oldest) = self.ids.pop_front() else {
                break;
            };
            // A file that cannot be deleted is forgotten anyway; the next
            // discovery evicts it again.
            match backend.remove(Document::Snapshot(oldest)) {
                Ok(()) => info!(snapshot = %oldest, "evicted snapshot"),
                Err(e) => warn!(snapshot = %oldest, error = %e, "failed to delete evicted snapshot"),
            }
        }
    }
}
