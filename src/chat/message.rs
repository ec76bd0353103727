//! Outgoing message model shared by the renderer and chat gateways.

use chrono::{DateTime, Utc};

use super::component::ComponentToken;

/// RGB embed colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour(u32);

impl Colour {
    /// Colour for open pull requests.
    pub const GREEN: Self = Self(0x003f_b950);
    /// Colour for closed pull requests.
    pub const RED: Self = Self(0x00f8_5149);
    /// Colour for merged pull requests.
    pub const PURPLE: Self = Self(0x00a3_71f7);
    /// Colour for draft pull requests.
    pub const GREY: Self = Self(0x008b_949e);
    /// Colour for new comment notifications.
    pub const ORANGE: Self = Self(0x00ff_c800);
    /// Colour for commit notifications.
    pub const PINK: Self = Self(0x00ff_afaf);
    /// Colour for label notifications.
    pub const LIGHT_GREY: Self = Self(0x00c0_c0c0);
    /// Colour for push digests.
    pub const BLURPLE: Self = Self(0x0072_88da);

    /// Wraps a raw `0xRRGGBB` value.
    #[must_use]
    pub const fn from_rgb(value: u32) -> Self {
        Self(value & 0x00ff_ffff)
    }

    /// Returns the raw `0xRRGGBB` value.
    #[must_use]
    pub const fn rgb(self) -> u32 {
        self.0
    }
}

/// Author line rendered at the top of an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    /// Display name.
    pub name: String,
    /// Link target.
    pub url: Option<String>,
    /// Avatar image.
    pub icon_url: Option<String>,
}

/// Named field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    /// Field heading.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Whether the field may share a row with its neighbours.
    pub inline: bool,
}

/// Rich embed block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    /// Title line.
    pub title: Option<String>,
    /// Link applied to the title.
    pub url: Option<String>,
    /// Main body.
    pub description: Option<String>,
    /// Side bar colour.
    pub colour: Option<Colour>,
    /// Author line.
    pub author: Option<EmbedAuthor>,
    /// Additional fields in display order.
    pub fields: Vec<EmbedField>,
    /// Timestamp shown in the footer.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    /// Starts an embed with the given title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Sets the title link.
    #[must_use]
    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the side bar colour.
    #[must_use]
    pub const fn with_colour(mut self, colour: Colour) -> Self {
        self.colour = Some(colour);
        self
    }

    /// Sets the author line.
    #[must_use]
    pub fn with_author(mut self, author: Option<EmbedAuthor>) -> Self {
        self.author = author;
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    /// Sets the footer timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Button visual style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    /// Blurple call to action.
    Primary,
    /// Grey.
    Secondary,
    /// Green.
    Success,
    /// Red.
    Danger,
}

impl ButtonStyle {
    /// Discord wire code for the style.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Primary => 1,
            Self::Secondary => 2,
            Self::Success => 3,
            Self::Danger => 4,
        }
    }
}

/// Clickable button carrying a component token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label.
    pub label: String,
    /// Visual style.
    pub style: ButtonStyle,
    /// Token returned by the platform when the button is clicked.
    pub token: ComponentToken,
}

/// Message posted to a channel or thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Plain text content.
    pub content: Option<String>,
    /// Embeds in display order.
    pub embeds: Vec<Embed>,
    /// Buttons rendered on a single action row.
    pub buttons: Vec<Button>,
    /// Whether only the invoking user can see the message (interaction
    /// follow-ups only).
    pub ephemeral: bool,
}

impl OutgoingMessage {
    /// Message with a single embed.
    #[must_use]
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Message with plain text content.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Appends a button.
    #[must_use]
    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    /// Marks the message as visible only to the invoking user.
    #[must_use]
    pub const fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}
