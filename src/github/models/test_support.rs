//! Test helpers for constructing pull request fixtures.
//!
//! # Examples
//!
//! ```
//! use inquisitor::github::models::test_support::{comment_with_id, open_pull_request};
//!
//! let pull_request = open_pull_request(42, "Add widget");
//! assert_eq!(pull_request.number, 42);
//!
//! let comment = comment_with_id(3);
//! assert_eq!(comment.body.as_deref(), Some("Comment 3"));
//! ```

use super::{Author, IssueComment, IssueState, Label, PullRequest, PullRequestCommit};

/// Builds an author with only a login.
#[must_use]
pub fn author(login: &str) -> Author {
    Author {
        login: login.to_owned(),
        ..Default::default()
    }
}

/// Builds an open, non-draft pull request with the given number and title.
#[must_use]
pub fn open_pull_request(number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_owned(),
        html_url: Some(format!("https://github.com/acme/widget/pull/{number}")),
        author: Some(author("octocat")),
        state: IssueState::Open,
        ..Default::default()
    }
}

/// Builds a label whose name is derived from its id.
#[must_use]
pub fn label(id: u64) -> Label {
    Label {
        id,
        name: format!("label-{id}"),
    }
}

/// Builds an issue comment with body `Comment {id}` authored by `alice`.
#[must_use]
pub fn comment_with_id(id: u64) -> IssueComment {
    IssueComment {
        id,
        body: Some(format!("Comment {id}")),
        author: Some(author("alice")),
        html_url: Some(format!(
            "https://github.com/acme/widget/pull/42#issuecomment-{id}"
        )),
        created_at: None,
    }
}

/// Creates `count` comments with sequential ids starting from 1.
#[must_use]
pub fn create_comments(count: u64) -> Vec<IssueComment> {
    (1..=count).map(comment_with_id).collect()
}

/// Builds a commit with a synthetic SHA authored by `login`.
#[must_use]
pub fn commit(sha: &str, message: &str, login: &str) -> PullRequestCommit {
    PullRequestCommit {
        sha: sha.to_owned(),
        message: message.to_owned(),
        author: Some(author(login)),
        author_name: Some(login.to_owned()),
        html_url: Some(format!("https://github.com/acme/widget/commit/{sha}")),
        committed_at: None,
    }
}
