//! Fetches the live state of a tracked pull request.

use crate::github::error::GitHubError;
use crate::github::gateway::PullRequestGateway;
use crate::github::locator::PullRequestRef;
use crate::github::models::PullRequest;

/// Outcome of resolving a tracked pull request against GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The pull request was fetched.
    Found(Box<PullRequest>),
    /// GitHub reports the pull request as deleted or inaccessible.
    NotFound,
}

/// Resolves the pull request behind `reference`.
///
/// A 404 from GitHub becomes [`Resolution::NotFound`], which the caller
/// treats as a signal to stop tracking.
///
/// # Errors
///
/// Returns the remote [`GitHubError`] for every other failure; callers skip
/// the item for the current cycle and leave its snapshot unchanged.
pub async fn resolve(
    gateway: &dyn PullRequestGateway,
    reference: &PullRequestRef,
) -> Result<Resolution, GitHubError> {
    match gateway.pull_request(reference).await {
        Ok(pull_request) => Ok(Resolution::Found(Box::new(pull_request))),
        Err(error) if error.is_not_found() => Ok(Resolution::NotFound),
        Err(error) => Err(error),
    }
}
