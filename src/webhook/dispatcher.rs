//! Validates inbound deliveries and routes them to registered handlers.

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use uuid::Uuid;

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::error::WebhookError;
use super::event::{WebhookEvent, WebhookEventKind};
use super::handler::{HandlerContext, WebhookHandler};
use super::signature;

/// Header naming the event type.
pub const EVENT_HEADER: &str = "X-GitHub-Event";
/// Header carrying the delivery UUID.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";
/// Header carrying `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Status and body returned to the webhook sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Plain-text body.
    pub body: String,
}

impl From<WebhookError> for WebhookResponse {
    fn from(error: WebhookError) -> Self {
        Self {
            status: error.status(),
            body: error.to_string(),
        }
    }
}

/// Ordered handler table plus the optional shared secret.
pub struct WebhookDispatcher {
    secret: Option<String>,
    handlers: Vec<Arc<dyn WebhookHandler>>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("WebhookDispatcher")
            .field("signed", &self.secret.is_some())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl WebhookDispatcher {
    /// Creates a dispatcher; a blank secret disables signature checks.
    #[must_use]
    pub fn new(secret: Option<String>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            secret: secret.filter(|value| !value.trim().is_empty()),
            handlers: Vec::new(),
            telemetry,
        }
    }

    /// Appends a handler; handlers run in registration order.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Validates and dispatches one delivery.
    ///
    /// Never fails: every rejection is turned into its HTTP response.
    pub async fn dispatch(&self, headers: &HeaderMap, body: &[u8]) -> WebhookResponse {
        let event_name = header(headers, EVENT_HEADER).unwrap_or_default().to_owned();
        let (response, handled) = match self.process(headers, body).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(event = %event_name, %error, "webhook delivery rejected");
                (WebhookResponse::from(error), false)
            }
        };
        self.telemetry.record(TelemetryEvent::WebhookDelivered {
            event: event_name,
            handled,
            status: response.status.as_u16(),
        });
        response
    }

    async fn process(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(WebhookResponse, bool), WebhookError> {
        let event_name =
            header(headers, EVENT_HEADER).ok_or(WebhookError::MissingHeader(EVENT_HEADER))?;
        let delivery_raw = header(headers, DELIVERY_HEADER)
            .ok_or(WebhookError::MissingHeader(DELIVERY_HEADER))?;

        if let Some(secret) = &self.secret {
            signature::verify(secret, body, header(headers, SIGNATURE_HEADER))?;
        }

        let kind: WebhookEventKind = event_name.parse()?;
        let handlers: Vec<&Arc<dyn WebhookHandler>> = self
            .handlers
            .iter()
            .filter(|handler| handler.kind() == kind)
            .collect();
        if handlers.is_empty() {
            return Err(WebhookError::NoHandler(kind.to_string()));
        }
        let delivery = Uuid::parse_str(delivery_raw.trim())
            .map_err(|_| WebhookError::InvalidDeliveryId(delivery_raw.to_owned()))?;
        let event = WebhookEvent::decode(kind, body)?;

        let mut context = HandlerContext::new(delivery);
        for handler in handlers {
            handler.handle(&mut context, &event).await?;
            if context.is_handled() {
                break;
            }
        }

        let handled = context.is_handled();
        let (status, response_body) = context.take_response().unwrap_or_else(|| {
            let text = if handled { "Handled" } else { "Unhandled" };
            (StatusCode::ACCEPTED, text.to_owned())
        });
        tracing::info!(%delivery, event = %kind, handled, "webhook delivery processed");
        Ok((
            WebhookResponse {
                status,
                body: response_body,
            },
            handled,
        ))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
}
