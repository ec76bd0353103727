//! Last-observed pull request state and the diff between two observations.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::chat::ThreadId;
use crate::github::{PullRequest, PullRequestRef};

use super::state::PullRequestState;

/// Last-observed subset of pull request fields used for diffing.
///
/// Equality is structural; labels are a set so their order never matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    /// Tracked pull request.
    pub reference: PullRequestRef,
    /// Thread the pull request is mirrored into.
    pub thread: ThreadId,
    /// Number of issue comments.
    pub comment_count: u64,
    /// Number of commits.
    pub commit_count: u64,
    /// Applied label ids.
    pub labels: BTreeSet<u64>,
    /// Title.
    pub title: String,
    /// Body, empty when GitHub reports none.
    pub description: String,
    /// State, `None` when unknown.
    pub state: Option<PullRequestState>,
}

impl PullRequestSnapshot {
    /// Builds a snapshot from live data.
    #[must_use]
    pub fn from_live(reference: PullRequestRef, thread: ThreadId, live: &PullRequest) -> Self {
        Self {
            reference,
            thread,
            comment_count: live.comments,
            commit_count: live.commits,
            labels: live.labels.iter().map(|label| label.id).collect(),
            title: live.title.clone(),
            description: live.body.clone().unwrap_or_default(),
            state: Some(PullRequestState::from_live(live)),
        }
    }

    /// Snapshot with nothing observed yet.
    #[must_use]
    pub const fn bare(reference: PullRequestRef, thread: ThreadId) -> Self {
        Self {
            reference,
            thread,
            comment_count: 0,
            commit_count: 0,
            labels: BTreeSet::new(),
            title: String::new(),
            description: String::new(),
            state: None,
        }
    }
}

/// Exact partition of a label set change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDiff {
    /// Ids present only in the new set.
    pub added: BTreeSet<u64>,
    /// Ids present only in the old set.
    pub removed: BTreeSet<u64>,
}

impl LabelDiff {
    /// Computes `added = new - old` and `removed = old - new`.
    #[must_use]
    pub fn between(old: &BTreeSet<u64>, new: &BTreeSet<u64>) -> Self {
        Self {
            added: new.difference(old).copied().collect(),
            removed: old.difference(new).copied().collect(),
        }
    }

    /// Returns true when neither side changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Applies the diff to `old`, yielding `(old - removed) ∪ added`.
    #[must_use]
    pub fn apply(&self, old: &BTreeSet<u64>) -> BTreeSet<u64> {
        old.difference(&self.removed)
            .chain(self.added.iter())
            .copied()
            .collect()
    }
}

/// State transition between two observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// Previously stored state.
    pub from: Option<PullRequestState>,
    /// Newly observed state.
    pub to: Option<PullRequestState>,
}

impl StateTransition {
    /// Returns true when this transition enters `MERGED`.
    #[must_use]
    pub fn enters_merged(self) -> bool {
        self.to == Some(PullRequestState::Merged) && self.from != Some(PullRequestState::Merged)
    }
}

/// Every independent dimension that differs between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotChanges {
    /// Title or description changed.
    pub summary: bool,
    /// Index range of new comments, when the count grew.
    pub new_comments: Option<Range<u64>>,
    /// Index range of new commits, when the count grew.
    pub new_commits: Option<Range<u64>>,
    /// State transition, when the state changed.
    pub state: Option<StateTransition>,
    /// Label diff, when the set changed.
    pub labels: Option<LabelDiff>,
}

impl SnapshotChanges {
    /// Compares `old` against `new`.
    ///
    /// Counts are compared only against the stored value; a count that
    /// shrank produces no range.
    #[must_use]
    pub fn between(old: &PullRequestSnapshot, new: &PullRequestSnapshot) -> Self {
        let label_diff = LabelDiff::between(&old.labels, &new.labels);
        Self {
            summary: old.title != new.title || old.description != new.description,
            new_comments: growth(old.comment_count, new.comment_count),
            new_commits: growth(old.commit_count, new.commit_count),
            state: (old.state != new.state).then_some(StateTransition {
                from: old.state,
                to: new.state,
            }),
            labels: (!label_diff.is_empty()).then_some(label_diff),
        }
    }

    /// Returns true when the transition enters `MERGED`.
    #[must_use]
    pub fn enters_merged(&self) -> bool {
        self.state.is_some_and(StateTransition::enters_merged)
    }
}

fn growth(old: u64, new: u64) -> Option<Range<u64>> {
    (new > old).then_some(old..new)
}
