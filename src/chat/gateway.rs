//! Chat platform primitives consumed by tracking and interaction handling.

use async_trait::async_trait;

use super::error::ChatError;
use super::ids::{ChannelId, MessageId, ThreadId};
use super::message::OutgoingMessage;

/// Thread as reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Thread identifier.
    pub id: ThreadId,
    /// Channel the thread was started in.
    pub parent: Option<ChannelId>,
    /// Thread name.
    pub name: String,
    /// Whether the thread is archived.
    pub archived: bool,
}

/// Gateway to the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Looks up a thread; `None` when it no longer exists.
    async fn resolve_thread(&self, thread: ThreadId) -> Result<Option<ThreadInfo>, ChatError>;

    /// Posts a message and returns its id.
    async fn send_message(
        &self,
        channel: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, ChatError>;

    /// Replaces the content of an existing message.
    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        replacement: &OutgoingMessage,
    ) -> Result<(), ChatError>;

    /// Starts a thread from an existing message.
    async fn start_thread(
        &self,
        channel: ChannelId,
        message: MessageId,
        name: &str,
    ) -> Result<ThreadId, ChatError>;

    /// Pins a message in its channel.
    async fn pin_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError>;

    /// Archives or unarchives a thread.
    async fn set_thread_archived(&self, thread: ThreadId, archived: bool) -> Result<(), ChatError>;

    /// Sends a follow-up to a deferred interaction.
    async fn send_interaction_followup(
        &self,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ChatError>;
}
