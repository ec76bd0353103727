//! Failures while verifying or handling chat interactions.

use http::StatusCode;
use thiserror::Error;

use crate::chat::{ChatError, ComponentTokenError};
use crate::github::GitHubError;
use crate::persistence::PersistenceError;
use crate::sync::SyncError;

/// Errors raised by the interactions endpoint and its handlers.
#[derive(Debug, Error)]
pub enum InteractionError {
    /// A signature header was absent.
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    /// The request signature did not verify.
    #[error("invalid request signature")]
    InvalidSignature,

    /// The configured public key is not a hex Ed25519 key.
    #[error("invalid interaction public key: {0}")]
    InvalidPublicKey(String),

    /// The body is not a recognisable interaction.
    #[error("malformed interaction: {0}")]
    Malformed(String),

    /// The interaction type is not handled.
    #[error("unsupported interaction type {0}")]
    Unsupported(u8),

    /// The component token could not be decoded.
    #[error(transparent)]
    Token(#[from] ComponentTokenError),

    /// Tracking could not be changed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// GitHub rejected the change.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The chat platform rejected a follow-up.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The snapshot store failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl InteractionError {
    /// HTTP status for errors that reject the request itself.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Malformed(_) | Self::Unsupported(_) => StatusCode::BAD_REQUEST,
            Self::InvalidPublicKey(_)
            | Self::Token(_)
            | Self::Sync(_)
            | Self::GitHub(_)
            | Self::Chat(_)
            | Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message shown to the user who triggered the interaction.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Token(ComponentTokenError::Expired(_)) => {
                "This button has expired. Run the command again.".to_owned()
            }
            Self::Token(_) => "This button is no longer valid.".to_owned(),
            Self::Sync(SyncError::NotTracked(_)) => {
                "This thread is not tracking a pull request.".to_owned()
            }
            Self::Sync(SyncError::AlreadyTracked { reference, .. }) => {
                format!("{reference} is already tracked in another thread.")
            }
            Self::GitHub(GitHubError::NotFound { .. })
            | Self::Sync(SyncError::GitHub(GitHubError::NotFound { .. })) => {
                "The pull request could not be found on GitHub.".to_owned()
            }
            Self::GitHub(GitHubError::Authentication { .. }) => {
                "GitHub refused the change. Check the bot's permissions.".to_owned()
            }
            _ => "Something went wrong while handling this action.".to_owned(),
        }
    }
}
