//! Octocrab implementation of the pull request gateway.

use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use serde::Serialize;

use crate::github::error::GitHubError;
use crate::github::locator::{PersonalAccessToken, PullRequestRef, RepositorySlug};
use crate::github::models::{
    ApiComment, ApiCommit, ApiLabel, ApiPullRequest, IssueComment, Label, NewPullRequest,
    PullRequest, PullRequestCommit, PullRequestEdit,
};

use super::PullRequestGateway;
use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;

const PAGE_SIZE: u64 = 100;

#[derive(Debug, Serialize)]
struct PageQuery {
    per_page: u64,
    page: u64,
}

impl PageQuery {
    const FIRST: Self = Self::holding(0);

    /// Query for the page that holds item `index`.
    const fn holding(index: u64) -> Self {
        Self {
            per_page: PAGE_SIZE,
            page: index.div_euclid(PAGE_SIZE).saturating_add(1),
        }
    }
}

/// Items on the page holding `index` that come before it.
const fn leading_items(index: u64) -> u64 {
    index.rem_euclid(PAGE_SIZE)
}

/// Octocrab-backed gateway.
#[derive(Clone)]
pub struct OctocrabGateway {
    pub(super) client: Octocrab,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and API base URL.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::InvalidUrl` when the base URI cannot be parsed or
    /// `GitHubError::Api` when Octocrab fails to construct a client.
    pub fn for_token(token: &PersonalAccessToken, api_base: &str) -> Result<Self, GitHubError> {
        let octocrab = build_octocrab_client(token, api_base)?;
        Ok(Self::new(octocrab))
    }

    async fn fetch_all<T>(&self, operation: &str, route: String) -> Result<Vec<T>, GitHubError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.fetch_pages(operation, route, &PageQuery::FIRST).await
    }

    /// Fetches every item from index `skip` onward.
    async fn fetch_from<T>(
        &self,
        operation: &str,
        route: String,
        skip: u64,
    ) -> Result<Vec<T>, GitHubError>
    where
        T: serde::de::DeserializeOwned,
    {
        let items = self
            .fetch_pages(operation, route, &PageQuery::holding(skip))
            .await?;
        let leading = usize::try_from(leading_items(skip)).unwrap_or(usize::MAX);
        Ok(items.into_iter().skip(leading).collect())
    }

    async fn fetch_pages<T>(
        &self,
        operation: &str,
        route: String,
        query: &PageQuery,
    ) -> Result<Vec<T>, GitHubError>
    where
        T: serde::de::DeserializeOwned,
    {
        let page = self
            .client
            .get::<Page<T>, _, _>(route, Some(query))
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        self.client
            .all_pages(page)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))
    }
}

#[async_trait]
impl PullRequestGateway for OctocrabGateway {
    async fn pull_request(&self, reference: &PullRequestRef) -> Result<PullRequest, GitHubError> {
        self.client
            .get::<ApiPullRequest, _, _>(reference.pull_request_path(), None::<&()>)
            .await
            .map(ApiPullRequest::into)
            .map_err(|error| map_octocrab_error("pull request", &error))
    }

    async fn issue_comments(
        &self,
        reference: &PullRequestRef,
        skip: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        self.fetch_from::<ApiComment>("issue comments", reference.comments_path(), skip)
            .await
            .map(|comments| comments.into_iter().map(ApiComment::into).collect())
    }

    async fn pull_request_commits(
        &self,
        reference: &PullRequestRef,
        skip: u64,
    ) -> Result<Vec<PullRequestCommit>, GitHubError> {
        self.fetch_from::<ApiCommit>("pull request commits", reference.commits_path(), skip)
            .await
            .map(|commits| commits.into_iter().map(ApiCommit::into).collect())
    }

    async fn repository_labels(&self, repo: &RepositorySlug) -> Result<Vec<Label>, GitHubError> {
        self.fetch_all::<ApiLabel>("repository labels", repo.labels_path())
            .await
            .map(|labels| labels.into_iter().map(ApiLabel::into).collect())
    }

    async fn update_pull_request(
        &self,
        reference: &PullRequestRef,
        edit: &PullRequestEdit,
    ) -> Result<PullRequest, GitHubError> {
        self.client
            .patch::<ApiPullRequest, _, _>(reference.pull_request_path(), Some(edit))
            .await
            .map(ApiPullRequest::into)
            .map_err(|error| map_octocrab_error("update pull request", &error))
    }

    async fn create_pull_request(
        &self,
        repo: &RepositorySlug,
        request: &NewPullRequest,
    ) -> Result<PullRequest, GitHubError> {
        self.client
            .post::<_, ApiPullRequest>(repo.pulls_path(), Some(request))
            .await
            .map(ApiPullRequest::into)
            .map_err(|error| map_octocrab_error("create pull request", &error))
    }
}
