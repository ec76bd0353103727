//! Linking, creating, unlinking, and relinking tracked pull requests.

use std::sync::Arc;

use chrono::Utc;

use crate::chat::{ChannelId, ChatGateway, ThreadId};
use crate::github::models::NewPullRequest;
use crate::github::{
    PullRequest, PullRequestGateway, PullRequestNumber, PullRequestRef, RepositorySlug,
};
use crate::render;
use crate::tracking::{PullRequestSnapshot, TrackedSet};

use super::error::SyncError;

const DEFAULT_DESCRIPTION: &str = "Description pending..";

/// Parameters for opening a pull request from the organization's fork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    /// Title.
    pub title: String,
    /// Branch in the organization's fork holding the changes.
    pub head_branch: String,
    /// Target branch in the upstream repository.
    pub base: String,
    /// Body; a placeholder is used when absent.
    pub description: Option<String>,
    /// Whether to open as a draft.
    pub draft: bool,
}

/// Starts and stops tracking of pull requests.
pub struct PullRequestTracker {
    tracked: Arc<TrackedSet>,
    github: Arc<dyn PullRequestGateway>,
    chat: Arc<dyn ChatGateway>,
    channel: ChannelId,
    organization: String,
}

impl std::fmt::Debug for PullRequestTracker {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PullRequestTracker")
            .field("channel", &self.channel)
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}

impl PullRequestTracker {
    /// Creates a tracker posting into `channel`.
    #[must_use]
    pub fn new(
        tracked: Arc<TrackedSet>,
        github: Arc<dyn PullRequestGateway>,
        chat: Arc<dyn ChatGateway>,
        channel: ChannelId,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            tracked,
            github,
            chat,
            channel,
            organization: organization.into(),
        }
    }

    /// Starts tracking `reference` in a new thread and returns the thread.
    ///
    /// Posts the summary in the deployment channel, starts a thread from it,
    /// pins the summary, then persists the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyTracked`] when the pull request already
    /// has a thread, or the failing GitHub, chat, or storage error.
    pub async fn link(&self, reference: &PullRequestRef) -> Result<ThreadId, SyncError> {
        if let Some(thread) = self.tracked.thread_for(reference) {
            return Err(SyncError::AlreadyTracked {
                reference: reference.clone(),
                thread,
            });
        }
        let live = self.github.pull_request(reference).await?;
        self.link_live(reference, &live).await
    }

    async fn link_live(
        &self,
        reference: &PullRequestRef,
        live: &PullRequest,
    ) -> Result<ThreadId, SyncError> {
        let summary = render::summary_message(reference, live, Utc::now());
        let message = self.chat.send_message(self.channel, &summary).await?;
        let thread = self
            .chat
            .start_thread(self.channel, message, &render::thread_name(reference))
            .await?;
        if let Err(error) = self.chat.pin_message(self.channel, message).await {
            tracing::warn!(%reference, %thread, %error, "failed to pin summary");
        }

        self.tracked
            .track(&PullRequestSnapshot::from_live(reference.clone(), thread, live))?;
        self.register_head(live, thread);
        tracing::info!(%reference, %thread, "pull request linked");
        Ok(thread)
    }

    /// Opens a pull request from the organization's fork and links it.
    ///
    /// The head is `<organization>:<branch>` and a sponsorship footer is
    /// appended to the body.
    ///
    /// # Errors
    ///
    /// Returns the failing GitHub, chat, or storage error.
    pub async fn create_and_link(
        &self,
        repo: &RepositorySlug,
        draft: PullRequestDraft,
    ) -> Result<(PullRequest, ThreadId), SyncError> {
        let description = draft
            .description
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned());
        let request = NewPullRequest {
            title: draft.title,
            head: format!("{}:{}", self.organization, draft.head_branch),
            base: draft.base,
            body: format!(
                "{description}\n\n*Sponsored by [{org}](https://github.com/{org})*",
                org = self.organization
            ),
            maintainer_can_modify: true,
            draft: draft.draft,
        };
        let created = self.github.create_pull_request(repo, &request).await?;
        let reference = PullRequestRef::new(repo.clone(), PullRequestNumber::new(created.number)?);
        let thread = self.link_live(&reference, &created).await?;
        Ok((created, thread))
    }

    /// Stops tracking whatever is bound to `thread`, leaving the thread open
    /// with a relink affordance.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotTracked`] when nothing is bound to the thread.
    pub async fn unlink(&self, thread: ThreadId) -> Result<PullRequestRef, SyncError> {
        let reference = self
            .tracked
            .untrack(thread)?
            .ok_or(SyncError::NotTracked(thread))?;
        self.chat
            .send_message(
                thread.as_channel(),
                &render::unlink_notice(&reference, Utc::now()),
            )
            .await?;
        tracing::info!(%reference, %thread, "pull request unlinked");
        Ok(reference)
    }

    /// Re-tracks `reference` in `thread`.
    ///
    /// The live pull request seeds the snapshot when it can be fetched;
    /// otherwise a bare record is tracked and the next cycle fills it in.
    /// The thread is unarchived and a confirmation posted.
    ///
    /// # Errors
    ///
    /// Returns the failing chat or storage error.
    pub async fn relink(
        &self,
        thread: ThreadId,
        reference: &PullRequestRef,
    ) -> Result<(), SyncError> {
        let live = match self.github.pull_request(reference).await {
            Ok(live) => Some(live),
            Err(error) => {
                tracing::warn!(%reference, %error, "relinking without a fresh snapshot");
                None
            }
        };
        let snapshot = live.as_ref().map_or_else(
            || PullRequestSnapshot::bare(reference.clone(), thread),
            |pull_request| PullRequestSnapshot::from_live(reference.clone(), thread, pull_request),
        );
        self.tracked.track(&snapshot)?;
        if let Some(pull_request) = &live {
            self.register_head(pull_request, thread);
        }

        self.chat.set_thread_archived(thread, false).await?;
        self.chat
            .send_message(thread.as_channel(), &render::relink_confirmation(reference))
            .await?;
        tracing::info!(%reference, %thread, "pull request relinked");
        Ok(())
    }

    fn register_head(&self, live: &PullRequest, thread: ThreadId) {
        if let Some(head) = &live.head {
            self.tracked
                .register_branch(&head.repository, &head.branch, thread);
        }
    }
}
