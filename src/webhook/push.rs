//! Routes push digests into the thread tracking the pushed branch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chat::{ChatGateway, OutgoingMessage};
use crate::render::push_digest;
use crate::tracking::TrackedSet;

use super::error::WebhookError;
use super::event::{WebhookEvent, WebhookEventKind};
use super::handler::{HandlerContext, WebhookHandler};

/// Posts a commit digest when the pushed branch heads a tracked pull
/// request; leaves the event unhandled otherwise.
pub struct PushHandler {
    tracked: Arc<TrackedSet>,
    chat: Arc<dyn ChatGateway>,
}

impl PushHandler {
    /// Creates a handler reading the branch index of `tracked`.
    #[must_use]
    pub fn new(tracked: Arc<TrackedSet>, chat: Arc<dyn ChatGateway>) -> Self {
        Self { tracked, chat }
    }
}

#[async_trait]
impl WebhookHandler for PushHandler {
    fn kind(&self) -> WebhookEventKind {
        WebhookEventKind::Push
    }

    async fn handle(
        &self,
        context: &mut HandlerContext,
        event: &WebhookEvent,
    ) -> Result<(), WebhookError> {
        let WebhookEvent::Push(push) = event else {
            return Ok(());
        };
        let Some(branch) = push.branch() else {
            return Ok(());
        };
        let Some(thread) = self
            .tracked
            .thread_for_branch(&push.repository.full_name, branch)
        else {
            tracing::debug!(
                repository = %push.repository.full_name,
                branch,
                "push to untracked branch"
            );
            return Ok(());
        };
        if push.commits.is_empty() {
            context.mark_handled();
            return Ok(());
        }

        let message = OutgoingMessage::embed(push_digest(push));
        self.chat
            .send_message(thread.as_channel(), &message)
            .await
            .map_err(|error| WebhookError::Handler {
                message: error.to_string(),
            })?;
        context.mark_handled();
        Ok(())
    }
}
