//! Data models representing pull requests, comments, commits, and labels.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into public domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// GitHub account attached to a pull request, comment, or commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    /// Account login.
    pub login: String,
    /// Profile page URL.
    pub html_url: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

/// Repository label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Stable label identifier.
    pub id: u64,
    /// Label name.
    pub name: String,
}

/// Open/closed state as reported by the issues API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueState {
    /// The pull request is open.
    #[default]
    Open,
    /// The pull request is closed (merged or not).
    Closed,
}

/// Head branch of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadBranch {
    /// `owner/name` of the repository holding the branch.
    pub repository: String,
    /// Branch name without the `refs/heads/` prefix.
    pub branch: String,
}

/// Live pull request state fetched from GitHub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title of the pull request.
    pub title: String,
    /// Body text; GitHub reports `null` for an empty body.
    pub body: Option<String>,
    /// HTML URL for displaying to a user.
    pub html_url: Option<String>,
    /// Author account.
    pub author: Option<Author>,
    /// Open/closed state.
    pub state: IssueState,
    /// Whether the pull request is a draft.
    pub draft: bool,
    /// Whether the pull request has been merged.
    pub merged: bool,
    /// Number of issue comments.
    pub comments: u64,
    /// Number of commits.
    pub commits: u64,
    /// Labels currently applied.
    pub labels: Vec<Label>,
    /// Head branch, when the head repository still exists.
    pub head: Option<HeadBranch>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Issue comment on a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    pub body: Option<String>,
    /// Comment author.
    pub author: Option<Author>,
    /// HTML URL of the comment.
    pub html_url: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// Commit listed on a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestCommit {
    /// Full commit SHA.
    pub sha: String,
    /// Full commit message.
    pub message: String,
    /// GitHub account of the commit author, when linked.
    pub author: Option<Author>,
    /// Git author name from the commit itself.
    pub author_name: Option<String>,
    /// HTML URL of the commit.
    pub html_url: Option<String>,
    /// Commit author date.
    pub committed_at: Option<DateTime<Utc>>,
}

impl PullRequestCommit {
    /// Name used to group commits: the GitHub login when linked, otherwise
    /// the git author name.
    #[must_use]
    pub fn author_label(&self) -> &str {
        self.author
            .as_ref()
            .map(|author| author.login.as_str())
            .or(self.author_name.as_deref())
            .unwrap_or("unknown")
    }
}

/// Repository summary used for fork lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// `owner/name`.
    pub full_name: String,
    /// HTML URL.
    pub html_url: String,
    /// HTML URL of the parent repository when this is a fork.
    pub parent_html_url: Option<String>,
}

/// Issue created on GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    /// Issue number.
    pub number: u64,
    /// HTML URL.
    pub html_url: Option<String>,
}

/// Request body for creating a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Pull request title.
    pub title: String,
    /// Source in `owner:branch` form.
    pub head: String,
    /// Target branch.
    pub base: String,
    /// Pull request body.
    pub body: String,
    /// Whether maintainers of the base repository may push to the head.
    pub maintainer_can_modify: bool,
    /// Whether to open as a draft.
    pub draft: bool,
}

/// Request body for editing a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestEdit {
    /// Replacement title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Request body for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,
    /// Issue body.
    pub body: String,
    /// Label names to apply.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Logins to assign.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
    pub(crate) html_url: Option<String>,
    pub(crate) avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiLabel {
    pub(crate) id: u64,
    pub(crate) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRepository {
    pub(crate) full_name: String,
    #[serde(default)]
    pub(crate) html_url: Option<String>,
    #[serde(default)]
    pub(crate) parent: Option<Box<ApiRepository>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiBranch {
    #[serde(rename = "ref")]
    pub(crate) branch: String,
    pub(crate) repo: Option<ApiRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequest {
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) html_url: Option<String>,
    #[serde(default)]
    pub(crate) user: Option<ApiUser>,
    #[serde(default)]
    pub(crate) state: Option<String>,
    #[serde(default)]
    pub(crate) draft: Option<bool>,
    #[serde(default)]
    pub(crate) merged: Option<bool>,
    #[serde(default)]
    pub(crate) merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) comments: Option<u64>,
    #[serde(default)]
    pub(crate) commits: Option<u64>,
    #[serde(default)]
    pub(crate) labels: Vec<ApiLabel>,
    #[serde(default)]
    pub(crate) head: Option<ApiBranch>,
    #[serde(default)]
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiComment {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) user: Option<ApiUser>,
    #[serde(default)]
    pub(crate) html_url: Option<String>,
    #[serde(default)]
    pub(crate) created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiGitActor {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommitDetail {
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) author: Option<ApiGitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCommit {
    pub(crate) sha: String,
    pub(crate) commit: ApiCommitDetail,
    #[serde(default)]
    pub(crate) author: Option<ApiUser>,
    #[serde(default)]
    pub(crate) html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiIssue {
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) html_url: Option<String>,
}

impl From<ApiUser> for Option<Author> {
    fn from(value: ApiUser) -> Self {
        value.login.map(|login| Author {
            login,
            html_url: value.html_url,
            avatar_url: value.avatar_url,
        })
    }
}

impl From<ApiLabel> for Label {
    fn from(value: ApiLabel) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<ApiPullRequest> for PullRequest {
    fn from(value: ApiPullRequest) -> Self {
        let state = match value.state.as_deref() {
            Some(state) if state.eq_ignore_ascii_case("closed") => IssueState::Closed,
            _ => IssueState::Open,
        };
        Self {
            number: value.number,
            title: value.title.unwrap_or_default(),
            body: value.body,
            html_url: value.html_url,
            author: value.user.and_then(Option::<Author>::from),
            state,
            draft: value.draft.unwrap_or(false),
            merged: value.merged.unwrap_or(false) || value.merged_at.is_some(),
            comments: value.comments.unwrap_or(0),
            commits: value.commits.unwrap_or(0),
            labels: value.labels.into_iter().map(Label::from).collect(),
            head: value.head.and_then(|head| {
                head.repo.map(|repo| HeadBranch {
                    repository: repo.full_name,
                    branch: head.branch,
                })
            }),
            updated_at: value.updated_at,
        }
    }
}

impl From<ApiComment> for IssueComment {
    fn from(value: ApiComment) -> Self {
        Self {
            id: value.id,
            body: value.body,
            author: value.user.and_then(Option::<Author>::from),
            html_url: value.html_url,
            created_at: value.created_at,
        }
    }
}

impl From<ApiCommit> for PullRequestCommit {
    fn from(value: ApiCommit) -> Self {
        let (author_name, committed_at) = value
            .commit
            .author
            .map_or((None, None), |actor| (actor.name, actor.date));
        Self {
            sha: value.sha,
            message: value.commit.message,
            author: value.author.and_then(Option::<Author>::from),
            author_name,
            html_url: value.html_url,
            committed_at,
        }
    }
}

impl From<ApiRepository> for RepositoryInfo {
    fn from(value: ApiRepository) -> Self {
        let html_url = value
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}", value.full_name));
        Self {
            full_name: value.full_name,
            html_url,
            parent_html_url: value.parent.and_then(|parent| parent.html_url),
        }
    }
}

impl From<ApiIssue> for CreatedIssue {
    fn from(value: ApiIssue) -> Self {
        Self {
            number: value.number,
            html_url: value.html_url,
        }
    }
}
