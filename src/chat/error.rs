//! Error types exposed by the chat layer.

use thiserror::Error;

/// Errors surfaced while talking to the chat platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// The bot token was missing or blank.
    #[error("chat bot token is required")]
    MissingToken,

    /// The configured API base URL could not be used.
    #[error("chat API URL is invalid: {0}")]
    InvalidUrl(String),

    /// The request never reached the platform or the response was cut off.
    #[error("network error talking to chat platform: {message}")]
    Transport {
        /// Transport-level error detail.
        message: String,
    },

    /// The platform rejected the request.
    #[error("chat platform returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The platform replied with a body that could not be decoded.
    #[error("unexpected chat platform response: {message}")]
    Decode {
        /// Decoder error detail.
        message: String,
    },

    /// A component token could not be encoded into the message.
    #[error("invalid message component: {message}")]
    Component {
        /// Encoding failure detail.
        message: String,
    },
}
