//! Signed webhook intake from the source host.
//!
//! Deliveries are validated (headers, HMAC signature), decoded into a
//! [`WebhookEvent`], and handed to the handlers registered for that event
//! kind in registration order until one marks the event handled.

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handler;
pub mod ping;
pub mod push;
pub mod signature;

pub use dispatcher::{
    DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, WebhookDispatcher, WebhookResponse,
};
pub use error::WebhookError;
pub use event::{WebhookEvent, WebhookEventKind};
pub use handler::{HandlerContext, WebhookHandler};
pub use ping::PingHandler;
pub use push::PushHandler;
