//! Answers the `ping` GitHub sends when a webhook is configured.

use async_trait::async_trait;
use http::StatusCode;

use super::error::WebhookError;
use super::event::{WebhookEvent, WebhookEventKind};
use super::handler::{HandlerContext, WebhookHandler};

/// Replies `Pong!` to every ping.
#[derive(Debug, Default, Clone, Copy)]
pub struct PingHandler;

#[async_trait]
impl WebhookHandler for PingHandler {
    fn kind(&self) -> WebhookEventKind {
        WebhookEventKind::Ping
    }

    async fn handle(
        &self,
        context: &mut HandlerContext,
        event: &WebhookEvent,
    ) -> Result<(), WebhookError> {
        if let WebhookEvent::Ping(ping) = event {
            tracing::info!(
                delivery = %context.delivery(),
                hook_id = ?ping.hook_id,
                "webhook ping received"
            );
            context.respond(StatusCode::ACCEPTED, "Pong!");
            context.mark_handled();
        }
        Ok(())
    }
}
