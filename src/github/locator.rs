//! Identity wrappers for repositories and pull requests.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::error::GitHubError;

const GITHUB_WEB_PREFIXES: [&str; 2] = ["https://github.com/", "http://github.com/"];

/// Repository identifier in `owner/name` form.
///
/// Comparison, hashing, and ordering are case-insensitive because GitHub
/// treats repository names that way; the original spelling is kept for
/// display.
#[derive(Debug, Clone)]
pub struct RepositorySlug {
    owner: String,
    name: String,
}

impl RepositorySlug {
    /// Parses `owner/name`, tolerating surrounding whitespace, a trailing
    /// slash, or a leading `https://github.com/` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidRepository`] when the value does not
    /// contain exactly one non-empty owner and name.
    pub fn parse(input: &str) -> Result<Self, GitHubError> {
        let trimmed = input.trim();
        let without_prefix = GITHUB_WEB_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);
        let candidate = without_prefix.trim_end_matches('/');

        let mut segments = candidate.split('/');
        let (Some(owner), Some(name), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(GitHubError::InvalidRepository(input.to_owned()));
        };

        if owner.is_empty() || name.is_empty() {
            return Err(GitHubError::InvalidRepository(input.to_owned()));
        }

        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    /// Repository owner as supplied.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name as supplied.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner/name` in the original spelling.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Lowercased `owner/name`, used as the storage and index key.
    #[must_use]
    pub fn key(&self) -> String {
        self.full_name().to_ascii_lowercase()
    }

    pub(crate) fn labels_path(&self) -> String {
        format!("/repos/{}/{}/labels", self.owner, self.name)
    }

    pub(crate) fn pulls_path(&self) -> String {
        format!("/repos/{}/{}/pulls", self.owner, self.name)
    }

    pub(crate) fn issues_path(&self) -> String {
        format!("/repos/{}/{}/issues", self.owner, self.name)
    }

    pub(crate) fn repository_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner, self.name)
    }
}

impl PartialEq for RepositorySlug {
    fn eq(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for RepositorySlug {}

impl Hash for RepositorySlug {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for RepositorySlug {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RepositorySlug {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Validates that the number is positive.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidPullRequestNumber`] for zero.
    pub const fn new(value: u64) -> Result<Self, GitHubError> {
        if value == 0 {
            return Err(GitHubError::InvalidPullRequestNumber);
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PullRequestNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A pull request addressed by repository and number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PullRequestRef {
    repo: RepositorySlug,
    number: PullRequestNumber,
}

impl PullRequestRef {
    /// Creates a reference from already validated parts.
    #[must_use]
    pub const fn new(repo: RepositorySlug, number: PullRequestNumber) -> Self {
        Self { repo, number }
    }

    /// Parses `owner/name` plus a raw number.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when either part is invalid.
    pub fn parse(repo: &str, number: u64) -> Result<Self, GitHubError> {
        Ok(Self::new(
            RepositorySlug::parse(repo)?,
            PullRequestNumber::new(number)?,
        ))
    }

    /// Repository the pull request belongs to.
    #[must_use]
    pub const fn repo(&self) -> &RepositorySlug {
        &self.repo
    }

    /// Pull request number.
    #[must_use]
    pub const fn number(&self) -> PullRequestNumber {
        self.number
    }

    pub(crate) fn pull_request_path(&self) -> String {
        format!("{}/{}", self.repo.pulls_path(), self.number)
    }

    pub(crate) fn comments_path(&self) -> String {
        format!("{}/{}/comments", self.repo.issues_path(), self.number)
    }

    pub(crate) fn commits_path(&self) -> String {
        format!("{}/commits", self.pull_request_path())
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}#{}", self.repo, self.number)
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GitHubError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GitHubError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}
