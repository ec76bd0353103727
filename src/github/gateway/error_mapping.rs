//! Error mapping helpers for the Octocrab GitHub gateway implementations.

use http::StatusCode;

use crate::github::error::GitHubError;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GitHubError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        let message = format!(
            "{operation} failed with status {status}: {detail}",
            detail = source.message
        );
        return if status == StatusCode::NOT_FOUND {
            GitHubError::NotFound { message }
        } else if is_rate_limit_error(source) {
            GitHubError::RateLimitExceeded { message }
        } else if is_auth_failure(status) {
            GitHubError::Authentication { message }
        } else {
            GitHubError::Api { message }
        };
    }

    if is_network_error(error) {
        return GitHubError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    GitHubError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
