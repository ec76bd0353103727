//! In-memory [`SnapshotStore`] for tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::chat::ThreadId;
use crate::github::PullRequestRef;
use crate::persistence::PersistenceError;
use crate::tracking::PullRequestSnapshot;

use super::SnapshotStore;

/// Snapshot store that keeps rows in a map and counts writes.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    rows: Mutex<BTreeMap<PullRequestRef, PullRequestSnapshot>>,
    writes: Mutex<usize>,
}

impl InMemorySnapshotStore {
    /// Store pre-populated with `snapshots`.
    #[must_use]
    pub fn with_snapshots(snapshots: impl IntoIterator<Item = PullRequestSnapshot>) -> Self {
        let rows = snapshots
            .into_iter()
            .map(|snapshot| (snapshot.reference.clone(), snapshot))
            .collect();
        Self {
            rows: Mutex::new(rows),
            writes: Mutex::new(0),
        }
    }

    /// Number of upserts and removals performed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_write(&self) {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn upsert(&self, snapshot: &PullRequestSnapshot) -> Result<(), PersistenceError> {
        self.record_write();
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.retain(|reference, row| {
            row.thread != snapshot.thread || *reference == snapshot.reference
        });
        rows.insert(snapshot.reference.clone(), snapshot.clone());
        Ok(())
    }

    fn get(
        &self,
        reference: &PullRequestRef,
    ) -> Result<Option<PullRequestSnapshot>, PersistenceError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(reference).cloned())
    }

    fn get_by_thread(
        &self,
        thread: ThreadId,
    ) -> Result<Option<PullRequestSnapshot>, PersistenceError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.values().find(|row| row.thread == thread).cloned())
    }

    fn list_all(&self) -> Result<Vec<PullRequestSnapshot>, PersistenceError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.values().cloned().collect())
    }

    fn remove(&self, thread: ThreadId) -> Result<bool, PersistenceError> {
        self.record_write();
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|_, row| row.thread != thread);
        Ok(rows.len() != before)
    }
}
