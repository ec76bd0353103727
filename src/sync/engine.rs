//! Diffs live pull request state against the stored snapshot and posts the
//! notifications the difference implies.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::Arc;

use chrono::Utc;

use crate::chat::{ChannelId, ChatError, ChatGateway, OutgoingMessage, ThreadId};
use crate::github::models::Label;
use crate::github::{
    GitHubError, PullRequest, PullRequestGateway, PullRequestRef, Resolution, resolve,
};
use crate::render;
use crate::tracking::{
    LabelDiff, PullRequestSnapshot, SnapshotChanges, StateTransition, TrackedPullRequest,
    TrackedSet,
};

use super::error::SyncError;

/// What one reconciliation did to a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Live state matched the snapshot, or the item was unlinked while the
    /// cycle ran; nothing was written or posted.
    Unchanged,
    /// The snapshot was replaced and notifications were posted.
    Updated,
    /// The item entered `MERGED` and is no longer tracked.
    Merged,
    /// The thread or pull request disappeared and the item was dropped.
    Pruned,
}

/// Compares snapshots and emits notifications into tracked threads.
pub struct DiffNotifyEngine {
    tracked: Arc<TrackedSet>,
    github: Arc<dyn PullRequestGateway>,
    chat: Arc<dyn ChatGateway>,
    summary_channel: ChannelId,
}

impl std::fmt::Debug for DiffNotifyEngine {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DiffNotifyEngine")
            .field("tracked", &self.tracked)
            .field("summary_channel", &self.summary_channel)
            .finish_non_exhaustive()
    }
}

impl DiffNotifyEngine {
    /// Creates an engine posting summaries in `summary_channel`.
    #[must_use]
    pub fn new(
        tracked: Arc<TrackedSet>,
        github: Arc<dyn PullRequestGateway>,
        chat: Arc<dyn ChatGateway>,
        summary_channel: ChannelId,
    ) -> Self {
        Self {
            tracked,
            github,
            chat,
            summary_channel,
        }
    }

    /// Tracked set this engine mutates.
    #[must_use]
    pub fn tracked(&self) -> &Arc<TrackedSet> {
        &self.tracked
    }

    /// Fetches `entry` from GitHub and applies the difference.
    ///
    /// A pull request GitHub reports as missing is dropped from tracking.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] for remote and storage failures; the snapshot
    /// is left unchanged when the fetch itself fails.
    pub async fn reconcile(
        &self,
        entry: &TrackedPullRequest,
    ) -> Result<ReconcileOutcome, SyncError> {
        let old = self
            .tracked
            .store()
            .get_by_thread(entry.thread)?
            .filter(|snapshot| snapshot.reference == entry.reference)
            .unwrap_or_else(|| PullRequestSnapshot::bare(entry.reference.clone(), entry.thread));

        match resolve(self.github.as_ref(), &entry.reference).await? {
            Resolution::Found(live) => self.apply(entry, &live, &old).await,
            Resolution::NotFound => {
                tracing::info!(
                    reference = %entry.reference,
                    thread = %entry.thread,
                    "pull request no longer exists, dropping"
                );
                if self.tracked.release(entry)? {
                    Ok(ReconcileOutcome::Pruned)
                } else {
                    Ok(ReconcileOutcome::Unchanged)
                }
            }
        }
    }

    /// Applies `live` against `old` for `entry`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the snapshot cannot be written or the
    /// thread cannot be looked up. Individual notification failures are
    /// logged and do not abort the remaining notifications.
    pub async fn apply(
        &self,
        entry: &TrackedPullRequest,
        live: &PullRequest,
        old: &PullRequestSnapshot,
    ) -> Result<ReconcileOutcome, SyncError> {
        if let Some(head) = live.head.as_ref().filter(|_| self.tracked.is_tracked(entry)) {
            self.tracked
                .register_branch(&head.repository, &head.branch, entry.thread);
        }

        let new = PullRequestSnapshot::from_live(entry.reference.clone(), entry.thread, live);
        if new == *old {
            return Ok(ReconcileOutcome::Unchanged);
        }

        if !self.tracked.refresh(&new)? {
            tracing::debug!(
                reference = %entry.reference,
                thread = %entry.thread,
                "pull request was unlinked during the cycle, skipping"
            );
            return Ok(ReconcileOutcome::Unchanged);
        }

        let Some(thread) = self.chat.resolve_thread(entry.thread).await? else {
            tracing::warn!(
                reference = %entry.reference,
                thread = %entry.thread,
                "thread no longer resolves, dropping tracked pull request"
            );
            self.tracked.release(entry)?;
            return Ok(ReconcileOutcome::Pruned);
        };
        let summary_channel = thread.parent.unwrap_or(self.summary_channel);

        let changes = SnapshotChanges::between(old, &new);
        let notifier = Notifier {
            engine: self,
            reference: &entry.reference,
            thread: entry.thread,
            live,
        };

        if changes.summary || changes.state.is_some() {
            notifier
                .report("summary", notifier.refresh_summary(summary_channel).await);
        }
        if let Some(range) = changes.new_comments.clone() {
            notifier.report("comments", notifier.post_comments(range).await);
        }
        if let Some(range) = changes.new_commits.clone() {
            notifier.report("commits", notifier.post_commits(range).await);
        }
        if let Some(transition) = changes.state {
            notifier.report("state", notifier.post_state(transition).await);
        }
        if let Some(diff) = &changes.labels {
            notifier.report("labels", notifier.post_labels(diff).await);
        }

        if changes.enters_merged() {
            self.close(entry).await?;
            return Ok(ReconcileOutcome::Merged);
        }
        Ok(ReconcileOutcome::Updated)
    }

    /// Drops a merged item, posts the closing notice, and archives its
    /// thread. The thread is archived even when the notice cannot be sent.
    async fn close(&self, entry: &TrackedPullRequest) -> Result<(), SyncError> {
        let TrackedPullRequest { reference, thread } = entry;
        self.tracked.release(entry)?;
        tracing::info!(%reference, %thread, "pull request merged, archiving thread");
        let notice = render::closing_notice(reference, Utc::now());
        if let Err(error) = self.chat.send_message(thread.as_channel(), &notice).await {
            tracing::warn!(%reference, %thread, %error, "failed to post closing notice");
        }
        self.chat.set_thread_archived(*thread, true).await?;
        Ok(())
    }
}

struct Notifier<'a> {
    engine: &'a DiffNotifyEngine,
    reference: &'a PullRequestRef,
    thread: ThreadId,
    live: &'a PullRequest,
}

#[derive(Debug, thiserror::Error)]
enum NotifyError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl Notifier<'_> {
    fn report(&self, dimension: &str, result: Result<(), NotifyError>) {
        if let Err(error) = result {
            tracing::warn!(
                reference = %self.reference,
                thread = %self.thread,
                dimension,
                %error,
                "failed to post notification"
            );
        }
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        self.engine
            .chat
            .send_message(self.thread.as_channel(), message)
            .await?;
        Ok(())
    }

    async fn refresh_summary(&self, channel: ChannelId) -> Result<(), NotifyError> {
        let summary = render::summary_message(self.reference, self.live, Utc::now());
        self.engine
            .chat
            .edit_message(channel, self.thread.starter_message(), &summary)
            .await?;
        Ok(())
    }

    async fn post_comments(&self, range: Range<u64>) -> Result<(), NotifyError> {
        let comments = self
            .engine
            .github
            .issue_comments(self.reference, range.start)
            .await?;
        for comment in window(&comments, &range) {
            let embed = render::comment_embed(self.reference, comment);
            self.send(&OutgoingMessage::embed(embed)).await?;
        }
        Ok(())
    }

    async fn post_commits(&self, range: Range<u64>) -> Result<(), NotifyError> {
        let commits = self
            .engine
            .github
            .pull_request_commits(self.reference, range.start)
            .await?;
        let new_commits = window(&commits, &range);
        for embed in render::commit_embeds(self.reference, new_commits) {
            self.send(&OutgoingMessage::embed(embed)).await?;
        }
        Ok(())
    }

    async fn post_state(&self, transition: StateTransition) -> Result<(), NotifyError> {
        let embed = render::state_change_embed(self.live, transition.from, transition.to);
        self.send(&OutgoingMessage::embed(embed)).await
    }

    async fn post_labels(&self, diff: &LabelDiff) -> Result<(), NotifyError> {
        let added: Vec<Label> = self
            .live
            .labels
            .iter()
            .filter(|label| diff.added.contains(&label.id))
            .cloned()
            .collect();
        let removed = if diff.removed.is_empty() {
            Vec::new()
        } else {
            let known = self
                .engine
                .github
                .repository_labels(self.reference.repo())
                .await?;
            resolve_labels(&diff.removed, known)
        };
        let embed = render::labels_embed(self.live, &added, &removed);
        self.send(&OutgoingMessage::embed(embed)).await
    }
}

/// The part of `fetched` covering `range`, where `fetched` starts at
/// `range.start`; clamped to what was actually fetched.
fn window<'a, T>(fetched: &'a [T], range: &Range<u64>) -> &'a [T] {
    let wanted = usize::try_from(range.end.saturating_sub(range.start)).unwrap_or(usize::MAX);
    fetched.get(..wanted.min(fetched.len())).unwrap_or_default()
}

/// Maps label ids back to names; ids no longer defined keep a placeholder.
fn resolve_labels(ids: &BTreeSet<u64>, known: Vec<Label>) -> Vec<Label> {
    let mut by_id: BTreeMap<u64, Label> =
        known.into_iter().map(|label| (label.id, label)).collect();
    ids.iter()
        .map(|id| {
            by_id.remove(id).unwrap_or_else(|| Label {
                id: *id,
                name: format!("#{id}"),
            })
        })
        .collect()
}
