//! Handler capability and the per-delivery context handlers write into.

use async_trait::async_trait;
use http::StatusCode;
use uuid::Uuid;

use super::error::WebhookError;
use super::event::{WebhookEvent, WebhookEventKind};

/// Mutable state shared by the handlers of one delivery.
#[derive(Debug)]
pub struct HandlerContext {
    delivery: Uuid,
    handled: bool,
    response: Option<(StatusCode, String)>,
}

impl HandlerContext {
    /// Fresh context for `delivery`.
    #[must_use]
    pub const fn new(delivery: Uuid) -> Self {
        Self {
            delivery,
            handled: false,
            response: None,
        }
    }

    /// Delivery id from the request headers.
    #[must_use]
    pub const fn delivery(&self) -> Uuid {
        self.delivery
    }

    /// Marks the event handled, stopping dispatch to later handlers.
    pub const fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// Returns true once a handler claimed the event.
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        self.handled
    }

    /// Sets the HTTP response. Only the last call takes effect.
    pub fn respond(&mut self, status: StatusCode, body: impl Into<String>) {
        self.response = Some((status, body.into()));
    }

    pub(crate) fn take_response(&mut self) -> Option<(StatusCode, String)> {
        self.response.take()
    }
}

/// Processes decoded events of one kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Event kind this handler is registered for.
    fn kind(&self) -> WebhookEventKind;

    /// Handles `event`, marking the context handled when it claims it.
    async fn handle(
        &self,
        context: &mut HandlerContext,
        event: &WebhookEvent,
    ) -> Result<(), WebhookError>;
}
