//! Presentation state of a pull request.

use std::fmt;

use crate::chat::Colour;
use crate::github::{IssueState, PullRequest};

/// Closed set of states a tracked pull request can be in.
///
/// Persisted as a 1-based ordinal in declaration order; `0` encodes an
/// unknown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullRequestState {
    /// Open and ready for review.
    Open,
    /// Closed without merging.
    Closed,
    /// Open as a draft.
    Draft,
    /// Merged into the base branch.
    Merged,
}

impl PullRequestState {
    const ALL: [Self; 4] = [Self::Open, Self::Closed, Self::Draft, Self::Merged];

    /// Derives the state from a live pull request.
    ///
    /// The merged flag wins, then draft (only while open), then the
    /// open/closed state.
    #[must_use]
    pub const fn from_live(pull_request: &PullRequest) -> Self {
        if pull_request.merged {
            return Self::Merged;
        }
        match pull_request.state {
            IssueState::Open if pull_request.draft => Self::Draft,
            IssueState::Open => Self::Open,
            IssueState::Closed => Self::Closed,
        }
    }

    /// 1-based persistence ordinal.
    #[must_use]
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::Open => 1,
            Self::Closed => 2,
            Self::Draft => 3,
            Self::Merged => 4,
        }
    }

    /// Inverse of [`Self::ordinal`]; `None` for `0` or out-of-range values.
    #[must_use]
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        let index = usize::try_from(ordinal.checked_sub(1)?).ok()?;
        Self::ALL.get(index).copied()
    }

    /// Embed colour used when rendering this state.
    #[must_use]
    pub const fn colour(self) -> Colour {
        match self {
            Self::Open => Colour::GREEN,
            Self::Closed => Colour::RED,
            Self::Draft => Colour::GREY,
            Self::Merged => Colour::PURPLE,
        }
    }

    /// Status icon used when rendering this state.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Open => "🟢",
            Self::Closed => "🔴",
            Self::Draft => "⚪",
            Self::Merged => "🟣",
        }
    }

    /// Upper-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Draft => "DRAFT",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}
