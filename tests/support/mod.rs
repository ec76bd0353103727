//! Shared test utilities.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use inquisitor::chat::{
    ChannelId, ChatError, ChatGateway, MessageId, OutgoingMessage, ThreadId, ThreadInfo,
};
use inquisitor::github::models::{IssueComment, NewPullRequest, PullRequestCommit, PullRequestEdit};
use inquisitor::github::{
    GitHubError, Label, PullRequest, PullRequestGateway, PullRequestRef, RepositorySlug,
};
use tempfile::TempDir;

/// Creates a temporary directory for database tests.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// Items from index `skip` onward, as the paged gateway returns them.
fn after<T: Clone>(items: &[T], skip: u64) -> Vec<T> {
    let start = usize::try_from(skip).unwrap_or(usize::MAX);
    items.iter().skip(start).cloned().collect()
}

/// GitHub double serving one fixed pull request.
#[derive(Debug, Default)]
pub struct StaticGitHub {
    /// Returned for every pull request read or write.
    pub pull_request: PullRequest,
    /// Every issue comment on the pull request.
    pub comments: Vec<IssueComment>,
    /// Every commit on the pull request.
    pub commits: Vec<PullRequestCommit>,
    /// Every label defined on the repository.
    pub labels: Vec<Label>,
}

#[async_trait]
impl PullRequestGateway for StaticGitHub {
    async fn pull_request(&self, _reference: &PullRequestRef) -> Result<PullRequest, GitHubError> {
        Ok(self.pull_request.clone())
    }

    async fn issue_comments(
        &self,
        _reference: &PullRequestRef,
        skip: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        Ok(after(&self.comments, skip))
    }

    async fn pull_request_commits(
        &self,
        _reference: &PullRequestRef,
        skip: u64,
    ) -> Result<Vec<PullRequestCommit>, GitHubError> {
        Ok(after(&self.commits, skip))
    }

    async fn repository_labels(&self, _repo: &RepositorySlug) -> Result<Vec<Label>, GitHubError> {
        Ok(self.labels.clone())
    }

    async fn update_pull_request(
        &self,
        _reference: &PullRequestRef,
        _edit: &PullRequestEdit,
    ) -> Result<PullRequest, GitHubError> {
        Ok(self.pull_request.clone())
    }

    async fn create_pull_request(
        &self,
        _repo: &RepositorySlug,
        _request: &NewPullRequest,
    ) -> Result<PullRequest, GitHubError> {
        Ok(self.pull_request.clone())
    }
}

/// Chat double that records every sent and edited message.
#[derive(Debug)]
pub struct RecordingChat {
    parent: ChannelId,
    sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
    edited: Mutex<Vec<(ChannelId, MessageId)>>,
}

impl RecordingChat {
    /// Chat whose threads all live under `parent`.
    pub const fn new(parent: ChannelId) -> Self {
        Self {
            parent,
            sent: Mutex::new(Vec::new()),
            edited: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent so far with their channels.
    pub fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages edited so far with their channels.
    pub fn edited(&self) -> Vec<(ChannelId, MessageId)> {
        self.edited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChatGateway for RecordingChat {
    async fn resolve_thread(&self, thread: ThreadId) -> Result<Option<ThreadInfo>, ChatError> {
        Ok(Some(ThreadInfo {
            id: thread,
            parent: Some(self.parent),
            name: "thread".to_owned(),
            archived: false,
        }))
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, ChatError> {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push((channel, message.clone()));
        Ok(MessageId::new(u64::try_from(sent.len()).unwrap_or(u64::MAX)))
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        _replacement: &OutgoingMessage,
    ) -> Result<(), ChatError> {
        self.edited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel, message));
        Ok(())
    }

    async fn start_thread(
        &self,
        _channel: ChannelId,
        message: MessageId,
        _name: &str,
    ) -> Result<ThreadId, ChatError> {
        Ok(ThreadId::new(message.get()))
    }

    async fn pin_message(&self, _channel: ChannelId, _message: MessageId) -> Result<(), ChatError> {
        Ok(())
    }

    async fn set_thread_archived(
        &self,
        _thread: ThreadId,
        _archived: bool,
    ) -> Result<(), ChatError> {
        Ok(())
    }

    async fn send_interaction_followup(
        &self,
        _interaction_token: &str,
        _message: &OutgoingMessage,
    ) -> Result<(), ChatError> {
        Ok(())
    }
}
