//! Snowflake identifiers for chat entities.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw snowflake.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw snowflake.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Text channel that hosts pull request summaries.
    ChannelId
);
snowflake!(
    /// Thread attached to a tracked pull request.
    ThreadId
);
snowflake!(
    /// Message within a channel or thread.
    MessageId
);
snowflake!(
    /// Chat user.
    UserId
);

impl ThreadId {
    /// Threads are channels; messages are posted to them by channel id.
    #[must_use]
    pub const fn as_channel(self) -> ChannelId {
        ChannelId(self.0)
    }

    /// A thread started from a message shares that message's id, so the
    /// pinned summary is addressed through the thread id.
    #[must_use]
    pub const fn starter_message(self) -> MessageId {
        MessageId(self.0)
    }
}

impl From<MessageId> for ThreadId {
    fn from(value: MessageId) -> Self {
        Self(value.0)
    }
}

/// Parses a snowflake that Discord encodes as a decimal string.
pub(crate) fn parse_snowflake(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
