//! Error types exposed by the GitHub layer.

use thiserror::Error;

/// Errors surfaced while parsing identifiers or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    /// The repository identifier was not in `owner/name` form.
    #[error("repository must match owner/name: {0}")]
    InvalidRepository(String),

    /// The pull request number is not a valid integer.
    #[error("pull request number must be a positive integer")]
    InvalidPullRequestNumber,

    /// The supplied API base URL could not be parsed.
    #[error("GitHub API URL is invalid: {0}")]
    InvalidUrl(String),

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// The requested resource does not exist or is not visible to the token.
    #[error("GitHub resource not found: {message}")]
    NotFound {
        /// GitHub error message returned with the 404 response.
        message: String,
    },

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403/429 with a rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from GitHub.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },
}

impl GitHubError {
    /// Returns true when the remote reported the resource as missing.
    ///
    /// A missing pull request is terminal for tracking; every other remote
    /// failure is retried on the next reconciliation cycle.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for transient remote failures (network, rate limit,
    /// authentication, or server errors).
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::RateLimitExceeded { .. }
                | Self::Api { .. }
                | Self::Network { .. }
        )
    }
}
