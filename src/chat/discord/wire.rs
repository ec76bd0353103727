//! Discord JSON payloads.

use serde::{Deserialize, Serialize};

use crate::chat::error::ChatError;
use crate::chat::message::{Button, Embed, OutgoingMessage};

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const TEXT_INPUT: u8 = 4;
const EPHEMERAL_FLAG: u64 = 1 << 6;

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    embeds: Vec<WireEmbed>,
    components: Vec<WireActionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
}

#[derive(Debug, Serialize)]
struct WireEmbed {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<WireEmbedAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<WireEmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireEmbedAuthor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireEmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireActionRow {
    #[serde(rename = "type")]
    kind: u8,
    components: Vec<WireComponent>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireComponent {
    Button(WireButton),
    TextInput(WireTextInput),
}

#[derive(Debug, Serialize)]
struct WireButton {
    #[serde(rename = "type")]
    kind: u8,
    style: u8,
    label: String,
    custom_id: String,
}

#[derive(Debug, Serialize)]
struct WireTextInput {
    #[serde(rename = "type")]
    kind: u8,
    custom_id: String,
    style: u8,
    label: String,
    value: String,
    max_length: usize,
    required: bool,
}

/// Single text field shown in a modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    /// Identifier echoed back on submission.
    pub custom_id: String,
    /// Field label.
    pub label: String,
    /// Pre-filled value.
    pub value: String,
    /// Maximum accepted length.
    pub max_length: usize,
    /// Whether the field spans multiple lines.
    pub paragraph: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireModal {
    custom_id: String,
    title: String,
    components: Vec<WireActionRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCreated {
    pub(crate) id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChannel {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) parent_id: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) thread_metadata: Option<WireThreadMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireThreadMetadata {
    #[serde(default)]
    pub(crate) archived: bool,
}

pub(crate) fn message_payload(message: &OutgoingMessage) -> Result<WireMessage, ChatError> {
    let components = if message.buttons.is_empty() {
        Vec::new()
    } else {
        let buttons = message
            .buttons
            .iter()
            .map(button_payload)
            .collect::<Result<Vec<_>, _>>()?;
        vec![WireActionRow {
            kind: ACTION_ROW,
            components: buttons,
        }]
    };

    Ok(WireMessage {
        content: message.content.clone(),
        embeds: message.embeds.iter().map(embed_payload).collect(),
        components,
        flags: message.ephemeral.then_some(EPHEMERAL_FLAG),
    })
}

pub(crate) fn modal_payload(custom_id: String, title: String, field: TextField) -> WireModal {
    WireModal {
        custom_id,
        title,
        components: vec![WireActionRow {
            kind: ACTION_ROW,
            components: vec![WireComponent::TextInput(WireTextInput {
                kind: TEXT_INPUT,
                custom_id: field.custom_id,
                style: if field.paragraph { 2 } else { 1 },
                label: field.label,
                value: field.value,
                max_length: field.max_length,
                required: true,
            })],
        }],
    }
}

fn button_payload(button: &Button) -> Result<WireComponent, ChatError> {
    let custom_id = button
        .token
        .encode()
        .map_err(|error| ChatError::Component {
            message: error.to_string(),
        })?;
    Ok(WireComponent::Button(WireButton {
        kind: BUTTON,
        style: button.style.code(),
        label: button.label.clone(),
        custom_id,
    }))
}

fn embed_payload(embed: &Embed) -> WireEmbed {
    WireEmbed {
        title: embed.title.clone(),
        url: embed.url.clone(),
        description: embed.description.clone(),
        color: embed.colour.map(crate::chat::Colour::rgb),
        author: embed.author.as_ref().map(|author| WireEmbedAuthor {
            name: author.name.clone(),
            url: author.url.clone(),
            icon_url: author.icon_url.clone(),
        }),
        fields: embed
            .fields
            .iter()
            .map(|field| WireEmbedField {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect(),
        timestamp: embed.timestamp.map(|timestamp| timestamp.to_rfc3339()),
    }
}
