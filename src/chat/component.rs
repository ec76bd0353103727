//! Versioned tokens carried in button and modal custom ids.
//!
//! A token names the action, the pull request it targets, and an optional
//! expiry. The wire form is `pr1:<action>:<number>:<expiry>:<repo>` where the
//! expiry is a unix timestamp or `-` for tokens that never expire. The
//! repository comes last because it is the only free-form segment.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use thiserror::Error;

use crate::github::{PullRequestNumber, PullRequestRef, RepositorySlug};

const TOKEN_VERSION_PREFIX: &str = "pr1";
const NO_EXPIRY: &str = "-";

/// Maximum length of a custom id accepted by the chat platform.
pub const MAX_CUSTOM_ID_LEN: usize = 100;

/// Time a [`ComponentLifespan::Temporary`] token stays valid.
pub const TEMPORARY_LIFESPAN: Duration = Duration::minutes(30);

/// Errors raised while encoding or decoding component tokens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComponentTokenError {
    /// The token does not start with a supported version prefix.
    #[error("unsupported component token version in {0:?}")]
    UnsupportedVersion(String),

    /// The token did not have the expected number of segments.
    #[error("malformed component token: {0:?}")]
    Malformed(String),

    /// The action segment is not recognised.
    #[error("unknown component action: {0}")]
    UnknownAction(String),

    /// The repository or number segment is invalid.
    #[error("component token targets an invalid pull request: {0}")]
    InvalidTarget(String),

    /// The token expired before it was used.
    #[error("component token expired at {0}")]
    Expired(DateTime<Utc>),

    /// The encoded token exceeds the platform's custom id limit.
    #[error("component token is {0} characters; the limit is 100")]
    TooLong(usize),
}

/// Action requested by a button or modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Re-track a pull request against the originating thread.
    Relink,
    /// Edit the pull request title.
    EditTitle,
    /// Edit the pull request description.
    EditDescription,
}

impl ButtonAction {
    const fn code(self) -> &'static str {
        match self {
            Self::Relink => "relink",
            Self::EditTitle => "edit-title",
            Self::EditDescription => "edit-desc",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "relink" => Some(Self::Relink),
            "edit-title" => Some(Self::EditTitle),
            "edit-desc" => Some(Self::EditDescription),
            _ => None,
        }
    }
}

/// How long a component stays actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentLifespan {
    /// Never expires.
    Permanent,
    /// Expires [`TEMPORARY_LIFESPAN`] after issue.
    Temporary,
}

/// Decoded component token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentToken {
    action: ButtonAction,
    target: PullRequestRef,
    expires_at: Option<DateTime<Utc>>,
}

impl ComponentToken {
    /// Issues a token for `action` on `target`.
    #[must_use]
    pub fn issue(
        action: ButtonAction,
        target: PullRequestRef,
        lifespan: ComponentLifespan,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = match lifespan {
            ComponentLifespan::Permanent => None,
            ComponentLifespan::Temporary => Some(now + TEMPORARY_LIFESPAN),
        };
        Self {
            action,
            target,
            expires_at,
        }
    }

    /// Requested action.
    #[must_use]
    pub const fn action(&self) -> ButtonAction {
        self.action
    }

    /// Targeted pull request.
    #[must_use]
    pub const fn target(&self) -> &PullRequestRef {
        &self.target
    }

    /// Expiry, when the token is temporary.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns a copy of this token carrying a different action.
    #[must_use]
    pub fn with_action(&self, action: ButtonAction) -> Self {
        Self {
            action,
            ..self.clone()
        }
    }

    /// Encodes the token into a custom id.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentTokenError::TooLong`] when the encoded form exceeds
    /// [`MAX_CUSTOM_ID_LEN`].
    pub fn encode(&self) -> Result<String, ComponentTokenError> {
        let encoded = self.to_string();
        let length = encoded.chars().count();
        if length > MAX_CUSTOM_ID_LEN {
            return Err(ComponentTokenError::TooLong(length));
        }
        Ok(encoded)
    }

    /// Decodes a custom id, rejecting tokens that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentTokenError`] when the token is malformed, names an
    /// unknown action or invalid target, or has expired.
    pub fn decode(raw: &str, now: DateTime<Utc>) -> Result<Self, ComponentTokenError> {
        let mut segments = raw.splitn(5, ':');
        let (Some(version), Some(action), Some(number), Some(expiry), Some(repo)) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(ComponentTokenError::Malformed(raw.to_owned()));
        };

        if version != TOKEN_VERSION_PREFIX {
            return Err(ComponentTokenError::UnsupportedVersion(raw.to_owned()));
        }

        let parsed_action = ButtonAction::from_code(action)
            .ok_or_else(|| ComponentTokenError::UnknownAction(action.to_owned()))?;

        let parsed_number: u64 = number
            .parse()
            .map_err(|_| ComponentTokenError::InvalidTarget(raw.to_owned()))?;
        let target = RepositorySlug::parse(repo)
            .and_then(|slug| {
                PullRequestNumber::new(parsed_number)
                    .map(|pr_number| PullRequestRef::new(slug, pr_number))
            })
            .map_err(|error| ComponentTokenError::InvalidTarget(error.to_string()))?;

        let expires_at = parse_expiry(expiry, raw)?;
        if let Some(deadline) = expires_at
            && now >= deadline
        {
            return Err(ComponentTokenError::Expired(deadline));
        }

        Ok(Self {
            action: parsed_action,
            target,
            expires_at,
        })
    }
}

fn parse_expiry(segment: &str, raw: &str) -> Result<Option<DateTime<Utc>>, ComponentTokenError> {
    if segment == NO_EXPIRY {
        return Ok(None);
    }
    let seconds: i64 = segment
        .parse()
        .map_err(|_| ComponentTokenError::Malformed(raw.to_owned()))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(Some)
        .ok_or_else(|| ComponentTokenError::Malformed(raw.to_owned()))
}

impl fmt::Display for ComponentToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{TOKEN_VERSION_PREFIX}:{action}:{number}:",
            action = self.action.code(),
            number = self.target.number(),
        )?;
        match self.expires_at {
            Some(deadline) => write!(formatter, "{}", deadline.timestamp())?,
            None => formatter.write_str(NO_EXPIRY)?,
        }
        write!(formatter, ":{}", self.target.repo())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::{ButtonAction, ComponentLifespan, ComponentToken, ComponentTokenError};
    use crate::github::PullRequestRef;

    fn target() -> PullRequestRef {
        PullRequestRef::parse("acme/widget", 42).expect("reference should parse")
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("timestamp should be valid")
    }

    #[test]
    fn permanent_token_has_stable_wire_form() {
        let token = ComponentToken::issue(
            ButtonAction::Relink,
            target(),
            ComponentLifespan::Permanent,
            now(),
        );

        assert_eq!(
            token.encode().expect("token should encode"),
            "pr1:relink:42:-:acme/widget"
        );
    }

    #[rstest]
    #[case::relink(ButtonAction::Relink)]
    #[case::title(ButtonAction::EditTitle)]
    #[case::description(ButtonAction::EditDescription)]
    fn decoding_recovers_action_and_target(#[case] action: ButtonAction) {
        let token = ComponentToken::issue(action, target(), ComponentLifespan::Temporary, now());
        let encoded = token.encode().expect("token should encode");

        let decoded = ComponentToken::decode(&encoded, now()).expect("token should decode");

        assert_eq!(decoded.action(), action);
        assert_eq!(decoded.target(), &target());
        assert_eq!(decoded.expires_at(), Some(now() + Duration::minutes(30)));
    }

    #[test]
    fn temporary_token_expires_after_thirty_minutes() {
        let token = ComponentToken::issue(
            ButtonAction::EditTitle,
            target(),
            ComponentLifespan::Temporary,
            now(),
        );
        let encoded = token.encode().expect("token should encode");

        let result = ComponentToken::decode(&encoded, now() + Duration::minutes(31));

        assert!(
            matches!(result, Err(ComponentTokenError::Expired(_))),
            "expected expiry, got {result:?}"
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::short("pr1:relink:42")]
    #[case::bad_number("pr1:relink:abc:-:acme/widget")]
    #[case::bad_expiry("pr1:relink:42:soon:acme/widget")]
    #[case::bad_repo("pr1:relink:42:-:widget")]
    #[case::zero_number("pr1:relink:0:-:acme/widget")]
    fn malformed_tokens_are_rejected(#[case] raw: &str) {
        let result = ComponentToken::decode(raw, now());
        assert!(result.is_err(), "expected failure for {raw:?}");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result = ComponentToken::decode("pr9:relink:42:-:acme/widget", now());
        assert!(matches!(
            result,
            Err(ComponentTokenError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = ComponentToken::decode("pr1:merge:42:-:acme/widget", now());
        assert_eq!(
            result,
            Err(ComponentTokenError::UnknownAction("merge".to_owned()))
        );
    }

    #[test]
    fn overlong_repository_cannot_be_encoded() {
        let long_name = "w".repeat(100);
        let reference =
            PullRequestRef::parse(&format!("acme/{long_name}"), 1).expect("reference should parse");
        let token = ComponentToken::issue(
            ButtonAction::Relink,
            reference,
            ComponentLifespan::Permanent,
            now(),
        );

        assert!(matches!(
            token.encode(),
            Err(ComponentTokenError::TooLong(_))
        ));
    }
}
