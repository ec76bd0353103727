//! Rejections produced while validating and dispatching webhook deliveries.

use http::StatusCode;
use thiserror::Error;

/// Reasons a webhook delivery was rejected or failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The signature header did not match the HMAC of the body.
    #[error("Request signature does not match.")]
    SignatureMismatch,

    /// A required header was absent.
    #[error("Missing {0} request header.")]
    MissingHeader(&'static str),

    /// The event-type header named an event with no decoder.
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    /// The event type is known but no handler is registered for it.
    #[error("No handler registered for event type: {0}")]
    NoHandler(String),

    /// The delivery header was not a UUID.
    #[error("Delivery id is not a valid UUID: {0}")]
    InvalidDeliveryId(String),

    /// The body could not be decoded as the announced event.
    #[error("Malformed event payload: {0}")]
    MalformedPayload(String),

    /// A handler failed while processing a valid event.
    #[error("Handler failed: {message}")]
    Handler {
        /// Failure detail.
        message: String,
    },
}

impl WebhookError {
    /// HTTP status returned for this rejection.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::SignatureMismatch => StatusCode::FORBIDDEN,
            Self::MissingHeader(_)
            | Self::UnknownEvent(_)
            | Self::NoHandler(_)
            | Self::InvalidDeliveryId(_)
            | Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::Handler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
