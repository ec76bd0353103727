//! Commit digest for push webhooks.

use crate::chat::{Colour, Embed, EmbedAuthor};
use crate::webhook::event::PushEvent;

use super::{COMMIT_MESSAGE_MAX_LEN, DESCRIPTION_MAX_LEN, first_line, limit, short_sha};

/// Digest of the commits in a push, linking to the compare view.
#[must_use]
pub fn push_digest(push: &PushEvent) -> Embed {
    let branch = push.branch().unwrap_or(&push.git_ref);
    let count = push.commits.len();
    let plural = if count == 1 { "" } else { "s" };
    let lines: Vec<String> = push
        .commits
        .iter()
        .map(|commit| {
            format!(
                "[`{sha}`]({url}) {message} - {name}",
                sha = short_sha(&commit.id),
                url = commit.url.as_deref().unwrap_or_default(),
                message = limit(first_line(&commit.message), COMMIT_MESSAGE_MAX_LEN),
                name = commit.author.name,
            )
        })
        .collect();

    Embed::titled(format!(
        "[{repo}:{branch}] {count} new commit{plural}",
        repo = push.repository.full_name,
    ))
    .with_url(push.compare.clone())
    .with_description(limit(&lines.join("\n"), DESCRIPTION_MAX_LEN))
    .with_colour(Colour::BLURPLE)
    .with_author(push.sender.as_ref().map(|sender| EmbedAuthor {
        name: sender.login.clone(),
        url: sender.html_url.clone(),
        icon_url: sender.avatar_url.clone(),
    }))
}
