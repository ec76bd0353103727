//! Octocrab implementation of the repository gateway.

use async_trait::async_trait;

use crate::github::error::GitHubError;
use crate::github::locator::RepositorySlug;
use crate::github::models::{ApiIssue, ApiRepository, CreatedIssue, NewIssue, RepositoryInfo};

use super::RepositoryGateway;
use super::error_mapping::map_octocrab_error;
use super::pull_request::OctocrabGateway;

#[async_trait]
impl RepositoryGateway for OctocrabGateway {
    async fn repository(&self, repo: &RepositorySlug) -> Result<RepositoryInfo, GitHubError> {
        self.client
            .get::<ApiRepository, _, _>(repo.repository_path(), None::<&()>)
            .await
            .map(ApiRepository::into)
            .map_err(|error| map_octocrab_error("repository", &error))
    }

    async fn create_issue(
        &self,
        repo: &RepositorySlug,
        issue: &NewIssue,
    ) -> Result<CreatedIssue, GitHubError> {
        self.client
            .post::<_, ApiIssue>(repo.issues_path(), Some(issue))
            .await
            .map(ApiIssue::into)
            .map_err(|error| map_octocrab_error("create issue", &error))
    }
}
