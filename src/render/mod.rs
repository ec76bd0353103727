//! Embeds and messages posted into pull request threads.

mod push;


pub use push::push_digest;

use chrono::{DateTime, Utc};

use crate::chat::{
    Button, ButtonAction, ButtonStyle, Colour, ComponentLifespan, ComponentToken, Embed,
    EmbedAuthor, OutgoingMessage,
};
use crate::github::models::{Author, IssueComment, Label, PullRequestCommit};
use crate::github::{PullRequest, PullRequestRef};
use crate::tracking::PullRequestState;

/// Longest embed title accepted by the chat platform.
pub const TITLE_MAX_LEN: usize = 256;
/// Longest embed description accepted by the chat platform.
pub const DESCRIPTION_MAX_LEN: usize = 4096;
/// Longest commit message excerpt shown in a digest.
pub const COMMIT_MESSAGE_MAX_LEN: usize = 50;

const SHORT_SHA_LEN: usize = 7;
const UNKNOWN_STATE_ICON: &str = "❔";

/// Truncates `text` to at most `max` characters, replacing the tail with
/// `...` when it had to be cut.
#[must_use]
pub fn limit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub(crate) fn short_sha(sha: &str) -> String {
    sha.chars().take(SHORT_SHA_LEN).collect()
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

fn embed_author(author: Option<&Author>) -> Option<EmbedAuthor> {
    author.map(|account| EmbedAuthor {
        name: account.login.clone(),
        url: account.html_url.clone(),
        icon_url: account.avatar_url.clone(),
    })
}

fn state_label(state: Option<PullRequestState>) -> &'static str {
    state.map_or("UNKNOWN", PullRequestState::label)
}

fn state_icon(state: Option<PullRequestState>) -> &'static str {
    state.map_or(UNKNOWN_STATE_ICON, PullRequestState::icon)
}

/// Pinned summary for a pull request with edit buttons attached.
#[must_use]
pub fn summary_message(
    reference: &PullRequestRef,
    pull_request: &PullRequest,
    now: DateTime<Utc>,
) -> OutgoingMessage {
    let state = PullRequestState::from_live(pull_request);
    let body = pull_request.body.as_deref().unwrap_or_default();
    let embed = Embed::titled(limit(&pull_request.title, TITLE_MAX_LEN))
        .with_url(pull_request.html_url.clone())
        .with_description(limit(
            &format!("{} {body}", state.icon()),
            DESCRIPTION_MAX_LEN,
        ))
        .with_colour(state.colour())
        .with_author(embed_author(pull_request.author.as_ref()))
        .with_timestamp(pull_request.updated_at);

    let token = |action| {
        ComponentToken::issue(action, reference.clone(), ComponentLifespan::Permanent, now)
    };
    OutgoingMessage::embed(embed)
        .with_button(Button {
            label: "Edit title".to_owned(),
            style: ButtonStyle::Secondary,
            token: token(ButtonAction::EditTitle),
        })
        .with_button(Button {
            label: "Edit description".to_owned(),
            style: ButtonStyle::Secondary,
            token: token(ButtonAction::EditDescription),
        })
}

/// One embed announcing a new issue comment.
#[must_use]
pub fn comment_embed(reference: &PullRequestRef, comment: &IssueComment) -> Embed {
    Embed::titled(format!(
        "New comment on pull request #{}",
        reference.number()
    ))
    .with_url(comment.html_url.clone())
    .with_description(limit(
        comment.body.as_deref().unwrap_or_default(),
        DESCRIPTION_MAX_LEN,
    ))
    .with_colour(Colour::ORANGE)
    .with_author(embed_author(comment.author.as_ref()))
    .with_timestamp(comment.created_at)
}

/// Groups `commits` by consecutive author and renders one embed per group.
#[must_use]
pub fn commit_embeds(reference: &PullRequestRef, commits: &[PullRequestCommit]) -> Vec<Embed> {
    let mut groups: Vec<Vec<&PullRequestCommit>> = Vec::new();
    for commit in commits {
        match groups.last_mut() {
            Some(group)
                if group
                    .last()
                    .is_some_and(|previous| previous.author_label() == commit.author_label()) =>
            {
                group.push(commit);
            }
            _ => groups.push(vec![commit]),
        }
    }

    groups
        .into_iter()
        .map(|group| commit_group_embed(reference, &group))
        .collect()
}

fn commit_group_embed(reference: &PullRequestRef, group: &[&PullRequestCommit]) -> Embed {
    let lines: Vec<String> = group
        .iter()
        .map(|commit| {
            format!(
                "[`{sha}`]({url}) {message} - {name}",
                sha = short_sha(&commit.sha),
                url = commit.html_url.as_deref().unwrap_or_default(),
                message = limit(first_line(&commit.message), COMMIT_MESSAGE_MAX_LEN),
                name = commit
                    .author_name
                    .as_deref()
                    .unwrap_or_else(|| commit.author_label()),
            )
        })
        .collect();
    let plural = if group.len() == 1 { "" } else { "s" };
    let author = group.first().and_then(|commit| {
        embed_author(commit.author.as_ref()).or_else(|| {
            commit.author_name.as_ref().map(|name| EmbedAuthor {
                name: name.clone(),
                url: None,
                icon_url: None,
            })
        })
    });

    Embed::titled(format!(
        "[{repo}] {count} new commit{plural}",
        repo = reference.repo().name(),
        count = group.len(),
    ))
    .with_description(limit(&lines.join("\n"), DESCRIPTION_MAX_LEN))
    .with_colour(Colour::PINK)
    .with_author(author)
}

/// Notice of a state transition showing both states and their icons.
#[must_use]
pub fn state_change_embed(
    pull_request: &PullRequest,
    from: Option<PullRequestState>,
    to: Option<PullRequestState>,
) -> Embed {
    let colour = to.map_or(Colour::GREY, PullRequestState::colour);
    Embed::titled("PR State Change")
        .with_url(pull_request.html_url.clone())
        .with_description(format!(
            "`{old}` -> `{new}`\n{old_icon} -> {new_icon}",
            old = state_label(from),
            new = state_label(to),
            old_icon = state_icon(from),
            new_icon = state_icon(to),
        ))
        .with_colour(colour)
        .with_timestamp(pull_request.updated_at)
}

/// Lists added and removed labels, omitting an empty side.
#[must_use]
pub fn labels_embed(pull_request: &PullRequest, added: &[Label], removed: &[Label]) -> Embed {
    let join = |labels: &[Label]| {
        labels
            .iter()
            .map(|label| format!("`{}`", label.name))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut embed = Embed::titled("Labels Updated")
        .with_url(pull_request.html_url.clone())
        .with_colour(Colour::LIGHT_GREY);
    if !added.is_empty() {
        embed = embed.with_field("Added", join(added));
    }
    if !removed.is_empty() {
        embed = embed.with_field("Removed", join(removed));
    }
    embed
}

fn relink_button(reference: &PullRequestRef, now: DateTime<Utc>) -> Button {
    Button {
        label: "Relink".to_owned(),
        style: ButtonStyle::Primary,
        token: ComponentToken::issue(
            ButtonAction::Relink,
            reference.clone(),
            ComponentLifespan::Permanent,
            now,
        ),
    }
}

/// Terminal notice posted when a tracked pull request merges.
#[must_use]
pub fn closing_notice(reference: &PullRequestRef, now: DateTime<Utc>) -> OutgoingMessage {
    OutgoingMessage::embed(
        Embed::titled("Pull request merged")
            .with_description(format!(
                "{reference} was merged. This thread is no longer tracked and is being \
                 archived. Use **Relink** to start tracking it again."
            ))
            .with_colour(Colour::PURPLE),
    )
    .with_button(relink_button(reference, now))
}

/// Notice posted when a user stops tracking a pull request.
#[must_use]
pub fn unlink_notice(reference: &PullRequestRef, now: DateTime<Utc>) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "{reference} is no longer linked to this thread. Use **Relink** to track it again."
    ))
    .with_button(relink_button(reference, now))
}

/// Confirmation posted after a relink.
#[must_use]
pub fn relink_confirmation(reference: &PullRequestRef) -> OutgoingMessage {
    OutgoingMessage::text(format!("Relinked this thread to {reference}."))
}

/// Thread name for a tracked pull request: `"<repo name> [<number>]"`.
#[must_use]
pub fn thread_name(reference: &PullRequestRef) -> String {
    limit(
        &format!("{} [{}]", reference.repo().name(), reference.number()),
        100,
    )
}
