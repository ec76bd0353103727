//! GitHub access for tracked pull requests.
//!
//! This module wraps Octocrab behind gateway traits, parses repository and
//! pull request identifiers, and maps API failures into [`GitHubError`] so
//! the reconciliation loop can tell a missing pull request apart from a
//! transient remote failure.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod resolver;

pub use error::GitHubError;
pub use gateway::{OctocrabGateway, PullRequestGateway, RepositoryGateway};
pub use locator::{PersonalAccessToken, PullRequestNumber, PullRequestRef, RepositorySlug};
pub use models::{IssueState, Label, PullRequest};
pub use resolver::{Resolution, resolve};

#[cfg(test)]
pub use gateway::{MockPullRequestGateway, MockRepositoryGateway};
