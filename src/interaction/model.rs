//! Inbound interaction payloads and the responses sent back.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::chat::discord::{TextField, message_payload, modal_payload};
use crate::chat::ids::parse_snowflake;
use crate::chat::{ChannelId, ChatError, OutgoingMessage, UserId};

use super::error::InteractionError;

const PING: u8 = 1;
const MESSAGE_COMPONENT: u8 = 3;
const MODAL_SUBMIT: u8 = 5;

const PONG: u8 = 1;
const CHANNEL_MESSAGE: u8 = 4;
const DEFERRED_CHANNEL_MESSAGE: u8 = 5;
const DEFERRED_UPDATE_MESSAGE: u8 = 6;
const MODAL: u8 = 9;
const EPHEMERAL_FLAG: u64 = 1 << 6;

/// A button click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInteraction {
    /// Token for follow-up messages.
    pub token: String,
    /// Channel or thread the button was clicked in.
    pub channel: ChannelId,
    /// Custom id of the clicked button.
    pub custom_id: String,
}

/// A submitted modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSubmission {
    /// Token for follow-up messages.
    pub token: String,
    /// Channel or thread the modal was opened from.
    pub channel: ChannelId,
    /// Custom id of the modal.
    pub custom_id: String,
    /// Submitted text keyed by field custom id.
    pub values: BTreeMap<String, String>,
    /// User who submitted the modal, when the payload names one.
    pub user: Option<UserId>,
}

/// Interaction kinds this service handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Endpoint health check.
    Ping,
    /// Button click.
    Component(ComponentInteraction),
    /// Modal submission.
    ModalSubmit(ModalSubmission),
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    token: String,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    data: Option<RawData>,
    /// Present for interactions inside a guild.
    #[serde(default)]
    member: Option<RawMember>,
    /// Present for interactions in direct messages.
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawData {
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    components: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    components: Vec<RawInput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    custom_id: String,
    #[serde(default)]
    value: Option<String>,
}

impl Interaction {
    /// Parses the JSON body of an interaction request.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::Malformed`] when required fields are
    /// missing and [`InteractionError::Unsupported`] for other types.
    pub fn parse(body: &[u8]) -> Result<Self, InteractionError> {
        let raw: RawInteraction = serde_json::from_slice(body)
            .map_err(|error| InteractionError::Malformed(error.to_string()))?;
        match raw.kind {
            PING => Ok(Self::Ping),
            MESSAGE_COMPONENT => {
                let (channel, data) = raw.context()?;
                Ok(Self::Component(ComponentInteraction {
                    token: raw.token,
                    channel,
                    custom_id: data.custom_id,
                }))
            }
            MODAL_SUBMIT => {
                let (channel, data) = raw.context()?;
                let user = raw.submitter();
                Ok(Self::ModalSubmit(ModalSubmission {
                    token: raw.token,
                    channel,
                    custom_id: data.custom_id,
                    values: data.values,
                    user,
                }))
            }
            other => Err(InteractionError::Unsupported(other)),
        }
    }
}

struct Data {
    custom_id: String,
    values: BTreeMap<String, String>,
}

impl RawInteraction {
    fn submitter(&self) -> Option<UserId> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(self.user.as_ref())
            .and_then(|user| parse_snowflake(&user.id))
            .map(UserId::new)
    }

    fn context(&self) -> Result<(ChannelId, Data), InteractionError> {
        let channel = self
            .channel_id
            .as_deref()
            .and_then(parse_snowflake)
            .map(ChannelId::new)
            .ok_or_else(|| InteractionError::Malformed("missing channel_id".to_owned()))?;
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| InteractionError::Malformed("missing data".to_owned()))?;
        let custom_id = data
            .custom_id
            .clone()
            .ok_or_else(|| InteractionError::Malformed("missing custom_id".to_owned()))?;
        let values = data
            .components
            .iter()
            .flat_map(|row| row.components.iter())
            .map(|input| {
                (
                    input.custom_id.clone(),
                    input.value.clone().unwrap_or_default(),
                )
            })
            .collect();
        Ok((channel, Data { custom_id, values }))
    }
}

/// Immediate reply to an interaction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionResponse {
    /// Answer to a ping.
    Pong,
    /// Acknowledge a click without changing the message.
    DeferredUpdate,
    /// Acknowledge with a pending reply visible only to the user.
    DeferredEphemeral,
    /// Reply with a message.
    Message(OutgoingMessage),
    /// Open a modal with one text field.
    Modal {
        /// Custom id echoed back on submission.
        custom_id: String,
        /// Modal title.
        title: String,
        /// Field shown in the modal.
        field: TextField,
    },
}

impl InteractionResponse {
    /// Ephemeral text reply.
    #[must_use]
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self::Message(OutgoingMessage::text(text).ephemeral())
    }

    /// JSON body in the platform's wire format.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] when a button token cannot be encoded.
    pub fn to_json(&self) -> Result<Value, ChatError> {
        let body = match self {
            Self::Pong => json!({ "type": PONG }),
            Self::DeferredUpdate => json!({ "type": DEFERRED_UPDATE_MESSAGE }),
            Self::DeferredEphemeral => json!({
                "type": DEFERRED_CHANNEL_MESSAGE,
                "data": { "flags": EPHEMERAL_FLAG },
            }),
            Self::Message(message) => json!({
                "type": CHANNEL_MESSAGE,
                "data": message_payload(message)?,
            }),
            Self::Modal {
                custom_id,
                title,
                field,
            } => json!({
                "type": MODAL,
                "data": modal_payload(custom_id.clone(), title.clone(), field.clone()),
            }),
        };
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Interaction, InteractionResponse};
    use crate::chat::{ChannelId, UserId};
    use crate::chat::discord::TextField;
    use crate::interaction::InteractionError;

    #[test]
    fn parses_ping() {
        assert_eq!(
            Interaction::parse(br#"{"type":1}"#).expect("ping should parse"),
            Interaction::Ping
        );
    }

    #[test]
    fn parses_button_click() {
        let body = json!({
            "type": 3,
            "token": "tok",
            "channel_id": "900",
            "data": { "custom_id": "pr1:relink:42:-:acme/widget", "component_type": 2 }
        });

        let parsed = Interaction::parse(body.to_string().as_bytes()).expect("should parse");

        let Interaction::Component(click) = parsed else {
            panic!("expected component interaction");
        };
        assert_eq!(click.channel, ChannelId::new(900));
        assert_eq!(click.custom_id, "pr1:relink:42:-:acme/widget");
        assert_eq!(click.token, "tok");
    }

    #[test]
    fn parses_modal_values() {
        let body = json!({
            "type": 5,
            "token": "tok",
            "channel_id": "900",
            "member": { "user": { "id": "1234" } },
            "data": {
                "custom_id": "pr1:edit-title:42:1700000000:acme/widget",
                "components": [
                    { "type": 1, "components": [ { "type": 4, "custom_id": "title", "value": "New" } ] }
                ]
            }
        });

        let parsed = Interaction::parse(body.to_string().as_bytes()).expect("should parse");

        let Interaction::ModalSubmit(submission) = parsed else {
            panic!("expected modal submission");
        };
        assert_eq!(submission.values.get("title").map(String::as_str), Some("New"));
        assert_eq!(submission.user, Some(UserId::new(1234)));
    }

    #[test]
    fn direct_message_submitter_comes_from_user() {
        let body = json!({
            "type": 5,
            "token": "tok",
            "channel_id": "900",
            "user": { "id": "77" },
            "data": { "custom_id": "pr1:edit-title:42:1700000000:acme/widget", "components": [] }
        });

        let parsed = Interaction::parse(body.to_string().as_bytes()).expect("should parse");

        let Interaction::ModalSubmit(submission) = parsed else {
            panic!("expected modal submission");
        };
        assert_eq!(submission.user, Some(UserId::new(77)));
    }

    #[test]
    fn rejects_unsupported_types() {
        assert!(matches!(
            Interaction::parse(br#"{"type":2}"#),
            Err(InteractionError::Unsupported(2))
        ));
    }

    #[test]
    fn rejects_component_without_channel() {
        let body = json!({ "type": 3, "token": "tok", "data": { "custom_id": "x" } });
        assert!(matches!(
            Interaction::parse(body.to_string().as_bytes()),
            Err(InteractionError::Malformed(_))
        ));
    }

    #[test]
    fn modal_response_uses_text_input() {
        let response = InteractionResponse::Modal {
            custom_id: "pr1:edit-title:42:1700000000:acme/widget".to_owned(),
            title: "Edit title".to_owned(),
            field: TextField {
                custom_id: "title".to_owned(),
                label: "Title".to_owned(),
                value: "Old".to_owned(),
                max_length: 256,
                paragraph: false,
            },
        };

        let body = response.to_json().expect("modal should serialise");

        assert_eq!(body["type"], 9);
        assert_eq!(body["data"]["components"][0]["components"][0]["type"], 4);
        assert_eq!(body["data"]["components"][0]["components"][0]["value"], "Old");
    }

    #[test]
    fn deferred_ephemeral_sets_flag() {
        let body = InteractionResponse::DeferredEphemeral
            .to_json()
            .expect("should serialise");
        assert_eq!(body, json!({ "type": 5, "data": { "flags": 64 } }));
    }
}
