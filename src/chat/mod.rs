//! Chat platform access for pull request threads.
//!
//! The engine talks to the platform only through [`ChatGateway`]; the
//! Discord REST adapter lives in [`discord`].

pub mod component;
pub mod discord;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod message;

pub use component::{
    ButtonAction, ComponentLifespan, ComponentToken, ComponentTokenError, MAX_CUSTOM_ID_LEN,
};
pub use discord::DiscordRestGateway;
pub use error::ChatError;
pub use gateway::{ChatGateway, ThreadInfo};
pub use ids::{ChannelId, MessageId, ThreadId, UserId};
pub use message::{
    Button, ButtonStyle, Colour, Embed, EmbedAuthor, EmbedField, OutgoingMessage,
};

#[cfg(test)]
pub use gateway::MockChatGateway;
