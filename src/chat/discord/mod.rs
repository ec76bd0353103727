//! Discord REST implementation of [`ChatGateway`].

mod wire;


pub use wire::TextField;
pub(crate) use wire::{WireMessage, WireModal, message_payload, modal_payload};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::error::ChatError;
use super::gateway::{ChatGateway, ThreadInfo};
use super::ids::{ChannelId, MessageId, ThreadId, parse_snowflake};
use super::message::OutgoingMessage;
use wire::{WireChannel, WireCreated};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const THREAD_AUTO_ARCHIVE_MINUTES: u32 = 10_080;

/// Chat gateway backed by the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordRestGateway {
    client: reqwest::Client,
    api_base: String,
    token: String,
    application_id: u64,
}

impl DiscordRestGateway {
    /// Builds a gateway for the bot `token` against `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::MissingToken`] for a blank token,
    /// [`ChatError::InvalidUrl`] when `api_base` is not an absolute URL, or
    /// [`ChatError::Transport`] when the HTTP client cannot be built.
    pub fn new(token: &str, api_base: &str, application_id: u64) -> Result<Self, ChatError> {
        let trimmed_token = token.trim();
        if trimmed_token.is_empty() {
            return Err(ChatError::MissingToken);
        }
        url::Url::parse(api_base).map_err(|error| ChatError::InvalidUrl(error.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ChatError::Transport {
                message: error.to_string(),
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_owned(),
            token: trimmed_token.to_owned(),
            application_id,
        })
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ChatError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.api_base))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token));
        if let Some(payload) = body {
            request = request.json(payload);
        }
        request.send().await.map_err(|error| ChatError::Transport {
            message: error.to_string(),
        })
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|error| error.to_string());
        Err(ChatError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ChatError> {
        Self::expect_success(response)
            .await?
            .json::<T>()
            .await
            .map_err(|error| ChatError::Decode {
                message: error.to_string(),
            })
    }
}

fn snowflake(raw: &str) -> Result<u64, ChatError> {
    parse_snowflake(raw).ok_or_else(|| ChatError::Decode {
        message: format!("invalid snowflake {raw:?}"),
    })
}

#[async_trait]
impl ChatGateway for DiscordRestGateway {
    async fn resolve_thread(&self, thread: ThreadId) -> Result<Option<ThreadInfo>, ChatError> {
        let response = self
            .send::<()>(Method::GET, &format!("/channels/{thread}"), None)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let channel: WireChannel = Self::decode(response).await?;
        Ok(Some(ThreadInfo {
            id: ThreadId::new(snowflake(&channel.id)?),
            parent: channel
                .parent_id
                .as_deref()
                .and_then(parse_snowflake)
                .map(ChannelId::new),
            name: channel.name.unwrap_or_default(),
            archived: channel
                .thread_metadata
                .is_some_and(|metadata| metadata.archived),
        }))
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageId, ChatError> {
        let payload = message_payload(message)?;
        let response = self
            .send(
                Method::POST,
                &format!("/channels/{channel}/messages"),
                Some(&payload),
            )
            .await?;
        let created: WireCreated = Self::decode(response).await?;
        Ok(MessageId::new(snowflake(&created.id)?))
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        replacement: &OutgoingMessage,
    ) -> Result<(), ChatError> {
        let payload = message_payload(replacement)?;
        let response = self
            .send(
                Method::PATCH,
                &format!("/channels/{channel}/messages/{message}"),
                Some(&payload),
            )
            .await?;
        Self::expect_success(response).await.map(drop)
    }

    async fn start_thread(
        &self,
        channel: ChannelId,
        message: MessageId,
        name: &str,
    ) -> Result<ThreadId, ChatError> {
        let body = json!({
            "name": name,
            "auto_archive_duration": THREAD_AUTO_ARCHIVE_MINUTES,
        });
        let response = self
            .send(
                Method::POST,
                &format!("/channels/{channel}/messages/{message}/threads"),
                Some(&body),
            )
            .await?;
        let created: WireCreated = Self::decode(response).await?;
        Ok(ThreadId::new(snowflake(&created.id)?))
    }

    async fn pin_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError> {
        let response = self
            .send::<()>(
                Method::PUT,
                &format!("/channels/{channel}/pins/{message}"),
                None,
            )
            .await?;
        Self::expect_success(response).await.map(drop)
    }

    async fn set_thread_archived(&self, thread: ThreadId, archived: bool) -> Result<(), ChatError> {
        let body = json!({ "archived": archived });
        let response = self
            .send(Method::PATCH, &format!("/channels/{thread}"), Some(&body))
            .await?;
        Self::expect_success(response).await.map(drop)
    }

    async fn send_interaction_followup(
        &self,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), ChatError> {
        let payload: WireMessage = message_payload(message)?;
        let response = self
            .send(
                Method::POST,
                &format!(
                    "/webhooks/{application}/{interaction_token}",
                    application = self.application_id
                ),
                Some(&payload),
            )
            .await?;
        Self::expect_success(response).await.map(drop)
    }
}
