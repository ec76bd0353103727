//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;

use crate::github::error::GitHubError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Builds an Octocrab client for the given token and API base URL.
///
/// Must be called from within a Tokio runtime because Octocrab spawns its
/// connection machinery on construction.
///
/// # Errors
///
/// Returns `GitHubError::InvalidUrl` when the base URI cannot be parsed or
/// `GitHubError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, GitHubError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| GitHubError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| GitHubError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
