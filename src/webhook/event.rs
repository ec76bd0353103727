//! Typed webhook payloads.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::WebhookError;

/// Closed set of event types with a registered decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEventKind {
    /// Sent when a webhook is first configured.
    Ping,
    /// Sent for every push to a branch or tag.
    Push,
}

impl WebhookEventKind {
    /// Header value naming this event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for WebhookEventKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for WebhookEventKind {
    type Err = WebhookError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "ping" => Ok(Self::Ping),
            "push" => Ok(Self::Push),
            other => Err(WebhookError::UnknownEvent(other.to_owned())),
        }
    }
}

/// Payload of a `ping` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PingEvent {
    /// Random GitHub zen string.
    #[serde(default)]
    pub zen: Option<String>,
    /// Id of the webhook that sent the ping.
    #[serde(default)]
    pub hook_id: Option<u64>,
}

/// Repository a push landed in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushRepository {
    /// `owner/name`.
    pub full_name: String,
    /// HTML URL.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Account that performed the push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushSender {
    /// Account login.
    pub login: String,
    /// Profile URL.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Git identity recorded on a pushed commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushCommitAuthor {
    /// Git author name.
    pub name: String,
    /// GitHub login when linked.
    #[serde(default)]
    pub username: Option<String>,
}

/// A commit included in a push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushCommit {
    /// Full SHA.
    pub id: String,
    /// Commit message.
    pub message: String,
    /// Commit URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Commit author.
    pub author: PushCommitAuthor,
}

/// Payload of a `push` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    /// Full ref, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Compare URL covering the pushed range.
    #[serde(default)]
    pub compare: Option<String>,
    /// Target repository.
    pub repository: PushRepository,
    /// Account that pushed.
    #[serde(default)]
    pub sender: Option<PushSender>,
    /// Pushed commits, oldest first.
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

impl PushEvent {
    /// Branch name when the ref is a branch.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/heads/")
    }
}

/// Decoded event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `ping` payload.
    Ping(PingEvent),
    /// `push` payload.
    Push(Box<PushEvent>),
}

impl WebhookEvent {
    /// Tag of the decoded variant.
    #[must_use]
    pub const fn kind(&self) -> WebhookEventKind {
        match self {
            Self::Ping(_) => WebhookEventKind::Ping,
            Self::Push(_) => WebhookEventKind::Push,
        }
    }

    /// Decodes `body` as the payload for `kind`.
    ///
    /// Only the first JSON value is read; trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::MalformedPayload`] when the body does not
    /// start with a valid payload of the expected shape.
    pub fn decode(kind: WebhookEventKind, body: &[u8]) -> Result<Self, WebhookError> {
        match kind {
            WebhookEventKind::Ping => decode_first(body).map(Self::Ping),
            WebhookEventKind::Push => decode_first(body).map(|push| Self::Push(Box::new(push))),
        }
    }
}

fn decode_first<T: DeserializeOwned>(body: &[u8]) -> Result<T, WebhookError> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<T>()
        .next()
        .unwrap_or_else(|| Err(serde::de::Error::custom("empty payload")))
        .map_err(|error| WebhookError::MalformedPayload(error.to_string()))
}
