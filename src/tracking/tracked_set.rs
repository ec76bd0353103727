//! In-memory view of tracked pull requests, written through to the store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::chat::ThreadId;
use crate::github::PullRequestRef;
use crate::persistence::{PersistenceError, SnapshotStore};

use super::snapshot::PullRequestSnapshot;

/// A pull request bound to a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPullRequest {
    /// Tracked pull request.
    pub reference: PullRequestRef,
    /// Thread it is mirrored into.
    pub thread: ThreadId,
}

#[derive(Debug, Default)]
struct Index {
    by_reference: BTreeMap<PullRequestRef, ThreadId>,
    by_thread: HashMap<ThreadId, PullRequestRef>,
    branches: HashMap<String, ThreadId>,
}

impl Index {
    fn insert(&mut self, reference: PullRequestRef, thread: ThreadId) {
        if let Some(previous_thread) = self.by_reference.remove(&reference) {
            self.forget_thread(previous_thread);
        }
        if let Some(previous_reference) = self.by_thread.remove(&thread) {
            self.by_reference.remove(&previous_reference);
        }
        self.by_reference.insert(reference.clone(), thread);
        self.by_thread.insert(thread, reference);
    }

    fn is_bound(&self, thread: ThreadId, reference: &PullRequestRef) -> bool {
        self.by_thread.get(&thread) == Some(reference)
    }

    fn forget_thread(&mut self, thread: ThreadId) -> Option<PullRequestRef> {
        self.branches.retain(|_, bound| *bound != thread);
        let reference = self.by_thread.remove(&thread)?;
        self.by_reference.remove(&reference);
        Some(reference)
    }
}

/// Branch index key: `lowercase(repo/branch)`.
#[must_use]
pub fn branch_key(repository: &str, branch: &str) -> String {
    format!("{repository}/{branch}").to_lowercase()
}

/// Thread-safe collection of tracked pull requests.
///
/// The store is the source of truth: every mutation is written to it before
/// the in-memory index changes, and the index is rebuilt from it on start.
/// Store writes happen under the index write lock, so a row is never
/// written back for an item another task has just dropped. Iteration hands
/// out a copy; callers holding a stale entry go through [`Self::refresh`]
/// and [`Self::release`].
pub struct TrackedSet {
    store: Arc<dyn SnapshotStore>,
    index: RwLock<Index>,
}

impl std::fmt::Debug for TrackedSet {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TrackedSet")
            .field("tracked", &self.read().by_reference.len())
            .finish_non_exhaustive()
    }
}

impl TrackedSet {
    /// Rebuilds the set from every snapshot in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be listed.
    pub fn load(store: Arc<dyn SnapshotStore>) -> Result<Self, PersistenceError> {
        let mut index = Index::default();
        for snapshot in store.list_all()? {
            index.insert(snapshot.reference, snapshot.thread);
        }
        Ok(Self {
            store,
            index: RwLock::new(index),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Backing store.
    #[must_use]
    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    /// Persists `snapshot` and starts tracking it.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails; the index is left
    /// untouched in that case.
    pub fn track(&self, snapshot: &PullRequestSnapshot) -> Result<(), PersistenceError> {
        let mut index = self.write();
        self.store.upsert(snapshot)?;
        index.insert(snapshot.reference.clone(), snapshot.thread);
        Ok(())
    }

    /// Replaces the stored snapshot of an item that is still tracked.
    ///
    /// Returns `false` without writing when the snapshot's thread has been
    /// unlinked or rebound to another pull request since it was listed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    pub fn refresh(&self, snapshot: &PullRequestSnapshot) -> Result<bool, PersistenceError> {
        let index = self.write();
        if !index.is_bound(snapshot.thread, &snapshot.reference) {
            return Ok(false);
        }
        self.store.upsert(snapshot)?;
        Ok(true)
    }

    /// Stops tracking whatever is bound to `thread`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store removal fails.
    pub fn untrack(&self, thread: ThreadId) -> Result<Option<PullRequestRef>, PersistenceError> {
        let mut index = self.write();
        self.store.remove(thread)?;
        Ok(index.forget_thread(thread))
    }

    /// Stops tracking `entry` if its thread is still bound to its pull
    /// request; returns whether anything was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store removal fails.
    pub fn release(&self, entry: &TrackedPullRequest) -> Result<bool, PersistenceError> {
        let mut index = self.write();
        if !index.is_bound(entry.thread, &entry.reference) {
            return Ok(false);
        }
        self.store.remove(entry.thread)?;
        index.forget_thread(entry.thread);
        Ok(true)
    }

    /// Returns true while `entry`'s thread is bound to its pull request.
    #[must_use]
    pub fn is_tracked(&self, entry: &TrackedPullRequest) -> bool {
        self.read().is_bound(entry.thread, &entry.reference)
    }

    /// Copy of every tracked item ordered by repository then number.
    #[must_use]
    pub fn entries(&self) -> Vec<TrackedPullRequest> {
        self.read()
            .by_reference
            .iter()
            .map(|(reference, thread)| TrackedPullRequest {
                reference: reference.clone(),
                thread: *thread,
            })
            .collect()
    }

    /// Number of tracked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().by_reference.len()
    }

    /// Returns true when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().by_reference.is_empty()
    }

    /// Thread bound to `reference`.
    #[must_use]
    pub fn thread_for(&self, reference: &PullRequestRef) -> Option<ThreadId> {
        self.read().by_reference.get(reference).copied()
    }

    /// Pull request bound to `thread`.
    #[must_use]
    pub fn reference_for(&self, thread: ThreadId) -> Option<PullRequestRef> {
        self.read().by_thread.get(&thread).cloned()
    }

    /// Records that pushes to `repository`/`branch` belong in `thread`.
    ///
    /// Ignored when the thread is no longer tracked.
    pub fn register_branch(&self, repository: &str, branch: &str, thread: ThreadId) {
        let mut index = self.write();
        if index.by_thread.contains_key(&thread) {
            index.branches.insert(branch_key(repository, branch), thread);
        }
    }

    /// Thread tracking the pull request whose head is `repository`/`branch`.
    #[must_use]
    pub fn thread_for_branch(&self, repository: &str, branch: &str) -> Option<ThreadId> {
        self.read()
            .branches
            .get(&branch_key(repository, branch))
            .copied()
    }
}
