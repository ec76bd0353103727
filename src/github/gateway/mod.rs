//! Gateways for talking to GitHub through Octocrab.
//!
//! The traits are the seams the tracking engine, interaction handlers, and
//! mod linker depend on; [`OctocrabGateway`] implements both against the
//! GitHub REST API.

mod client;
mod error_mapping;
mod pull_request;
mod repository;


pub use pull_request::OctocrabGateway;

use async_trait::async_trait;

use crate::github::error::GitHubError;
use crate::github::locator::{PullRequestRef, RepositorySlug};
use crate::github::models::{
    CreatedIssue, IssueComment, Label, NewIssue, NewPullRequest, PullRequest, PullRequestCommit,
    PullRequestEdit, RepositoryInfo,
};

/// Gateway for pull request reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestGateway: Send + Sync {
    /// Fetch the live pull request.
    async fn pull_request(&self, reference: &PullRequestRef) -> Result<PullRequest, GitHubError>;

    /// Fetch issue comments in creation order, skipping the first `skip`.
    ///
    /// Pages before the one holding comment `skip` are never requested.
    async fn issue_comments(
        &self,
        reference: &PullRequestRef,
        skip: u64,
    ) -> Result<Vec<IssueComment>, GitHubError>;

    /// Fetch commits in branch order, skipping the first `skip`.
    async fn pull_request_commits(
        &self,
        reference: &PullRequestRef,
        skip: u64,
    ) -> Result<Vec<PullRequestCommit>, GitHubError>;

    /// List every label defined on the repository.
    async fn repository_labels(&self, repo: &RepositorySlug) -> Result<Vec<Label>, GitHubError>;

    /// Replace the title and/or body of a pull request.
    async fn update_pull_request(
        &self,
        reference: &PullRequestRef,
        edit: &PullRequestEdit,
    ) -> Result<PullRequest, GitHubError>;

    /// Open a new pull request.
    async fn create_pull_request(
        &self,
        repo: &RepositorySlug,
        request: &NewPullRequest,
    ) -> Result<PullRequest, GitHubError>;
}

/// Gateway for repository-level operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Fetch repository metadata including its fork parent.
    async fn repository(&self, repo: &RepositorySlug) -> Result<RepositoryInfo, GitHubError>;

    /// Open an issue on the repository.
    async fn create_issue(
        &self,
        repo: &RepositorySlug,
        issue: &NewIssue,
    ) -> Result<CreatedIssue, GitHubError>;
}
