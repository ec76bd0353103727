//! Button and modal handling for tracked pull request threads.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chat::discord::TextField;
use crate::chat::{
    ButtonAction, ChatGateway, ComponentLifespan, ComponentToken, OutgoingMessage, ThreadId,
    UserId,
};
use crate::github::models::PullRequestEdit;
use crate::github::{GitHubError, PersonalAccessToken, PullRequestGateway, PullRequestRef};
use crate::persistence::LinkedAccountStore;
use crate::sync::PullRequestTracker;
use crate::tracking::TrackedSet;

use super::error::InteractionError;
use super::model::{ComponentInteraction, Interaction, InteractionResponse, ModalSubmission};

const TITLE_FIELD: &str = "title";
const DESCRIPTION_FIELD: &str = "description";
const TITLE_MAX_LENGTH: usize = 256;
const DESCRIPTION_MAX_LENGTH: usize = 4000;

/// Work acknowledged immediately and finished after the response is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// Re-track `target` against `thread`.
    Relink {
        /// Interaction token for error follow-ups.
        token: String,
        /// Thread the button was clicked in.
        thread: ThreadId,
        /// Pull request to track again.
        target: PullRequestRef,
    },
    /// Push an edited title or description to GitHub.
    Edit {
        /// Interaction token for the acknowledgement.
        token: String,
        /// Pull request being edited.
        target: PullRequestRef,
        /// Fields to replace.
        edit: PullRequestEdit,
        /// User who submitted the edit.
        user: Option<UserId>,
    },
}

/// Builds a GitHub gateway that acts with a user's own token.
pub type GatewayFactory = dyn Fn(&PersonalAccessToken) -> Result<Arc<dyn PullRequestGateway>, GitHubError>
    + Send
    + Sync;

struct LinkedEditors {
    accounts: LinkedAccountStore,
    connect: Box<GatewayFactory>,
}

impl LinkedEditors {
    fn gateway_for(
        &self,
        user: UserId,
    ) -> Result<Option<Arc<dyn PullRequestGateway>>, InteractionError> {
        let Some(stored) = self.accounts.token(user)? else {
            return Ok(None);
        };
        let token = PersonalAccessToken::new(stored)?;
        Ok(Some((self.connect)(&token)?))
    }
}

/// Routes button clicks and modal submissions.
///
/// Edits go through the bot's GitHub gateway unless linked accounts are
/// configured and the submitting user has linked one.
pub struct InteractionHandler {
    tracked: Arc<TrackedSet>,
    tracker: Arc<PullRequestTracker>,
    github: Arc<dyn PullRequestGateway>,
    chat: Arc<dyn ChatGateway>,
    editors: Option<LinkedEditors>,
}

impl std::fmt::Debug for InteractionHandler {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("InteractionHandler")
            .field("tracker", &self.tracker)
            .field("linked_accounts", &self.editors.is_some())
            .finish_non_exhaustive()
    }
}

impl InteractionHandler {
    /// Creates a handler over the shared tracking state.
    #[must_use]
    pub fn new(
        tracked: Arc<TrackedSet>,
        tracker: Arc<PullRequestTracker>,
        github: Arc<dyn PullRequestGateway>,
        chat: Arc<dyn ChatGateway>,
    ) -> Self {
        Self {
            tracked,
            tracker,
            github,
            chat,
            editors: None,
        }
    }

    /// Makes edits as the submitting user when `accounts` holds a token
    /// for them; `connect` builds the gateway for that token.
    #[must_use]
    pub fn with_linked_accounts(
        mut self,
        accounts: LinkedAccountStore,
        connect: impl Fn(&PersonalAccessToken) -> Result<Arc<dyn PullRequestGateway>, GitHubError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.editors = Some(LinkedEditors {
            accounts,
            connect: Box::new(connect),
        });
        self
    }

    /// Builds the immediate response and any deferred work.
    ///
    /// Failures become an ephemeral message to the user; they never escape
    /// as request errors.
    pub async fn respond(
        &self,
        interaction: Interaction,
        now: DateTime<Utc>,
    ) -> (InteractionResponse, Option<FollowUp>) {
        let outcome = match interaction {
            Interaction::Ping => Ok((InteractionResponse::Pong, None)),
            Interaction::Component(click) => self.on_component(click, now).await,
            Interaction::ModalSubmit(submission) => Self::on_modal(submission, now),
        };
        outcome.unwrap_or_else(|error| {
            tracing::warn!(%error, "interaction rejected");
            (InteractionResponse::ephemeral(error.user_message()), None)
        })
    }

    /// Finishes deferred work, reporting failures to the user.
    pub async fn complete(&self, follow_up: FollowUp) {
        match follow_up {
            FollowUp::Relink {
                token,
                thread,
                target,
            } => {
                if let Err(error) = self.tracker.relink(thread, &target).await {
                    tracing::warn!(%target, %thread, %error, "relink failed");
                    let failure = InteractionError::from(error);
                    self.follow_up(&token, failure.user_message()).await;
                }
            }
            FollowUp::Edit {
                token,
                target,
                edit,
                user,
            } => {
                let github = self.editor_for(user);
                let message = match github.update_pull_request(&target, &edit).await {
                    Ok(_) => {
                        tracing::info!(%target, "pull request edited from chat");
                        edit_confirmation(&target, &edit)
                    }
                    Err(error) => {
                        tracing::warn!(%target, %error, "pull request edit failed");
                        InteractionError::from(error).user_message()
                    }
                };
                self.follow_up(&token, message).await;
            }
        }
    }

    /// Gateway edits from `user` are made with.
    fn editor_for(&self, user: Option<UserId>) -> Arc<dyn PullRequestGateway> {
        let linked = self
            .editors
            .as_ref()
            .zip(user)
            .map(|(editors, user)| (user, editors.gateway_for(user)));
        match linked {
            Some((_, Ok(Some(gateway)))) => gateway,
            Some((user, Err(error))) => {
                tracing::warn!(%user, %error, "linked account unusable, editing as the bot");
                Arc::clone(&self.github)
            }
            Some((_, Ok(None))) | None => Arc::clone(&self.github),
        }
    }

    async fn on_component(
        &self,
        click: ComponentInteraction,
        now: DateTime<Utc>,
    ) -> Result<(InteractionResponse, Option<FollowUp>), InteractionError> {
        let token = ComponentToken::decode(&click.custom_id, now)?;
        match token.action() {
            ButtonAction::Relink => Ok((
                InteractionResponse::DeferredUpdate,
                Some(FollowUp::Relink {
                    token: click.token,
                    thread: ThreadId::new(click.channel.get()),
                    target: token.target().clone(),
                }),
            )),
            action @ (ButtonAction::EditTitle | ButtonAction::EditDescription) => {
                let modal = self.edit_modal(action, token.target(), now).await?;
                Ok((modal, None))
            }
        }
    }

    fn on_modal(
        submission: ModalSubmission,
        now: DateTime<Utc>,
    ) -> Result<(InteractionResponse, Option<FollowUp>), InteractionError> {
        let token = ComponentToken::decode(&submission.custom_id, now)?;
        let field = match token.action() {
            ButtonAction::EditTitle => TITLE_FIELD,
            ButtonAction::EditDescription => DESCRIPTION_FIELD,
            ButtonAction::Relink => {
                return Err(InteractionError::Malformed(
                    "relink tokens do not open modals".to_owned(),
                ));
            }
        };
        let value = submission
            .values
            .get(field)
            .cloned()
            .ok_or_else(|| InteractionError::Malformed(format!("missing {field} field")))?;
        let edit = if field == TITLE_FIELD {
            PullRequestEdit {
                title: Some(value),
                body: None,
            }
        } else {
            PullRequestEdit {
                title: None,
                body: Some(value),
            }
        };
        Ok((
            InteractionResponse::DeferredEphemeral,
            Some(FollowUp::Edit {
                token: submission.token,
                target: token.target().clone(),
                edit,
                user: submission.user,
            }),
        ))
    }

    async fn edit_modal(
        &self,
        action: ButtonAction,
        target: &PullRequestRef,
        now: DateTime<Utc>,
    ) -> Result<InteractionResponse, InteractionError> {
        let (title, description) = match self.tracked.store().get(target)? {
            Some(snapshot) => (snapshot.title, snapshot.description),
            None => {
                let live = self.github.pull_request(target).await?;
                (live.title, live.body.unwrap_or_default())
            }
        };

        let custom_id =
            ComponentToken::issue(action, target.clone(), ComponentLifespan::Temporary, now)
                .encode()?;
        let (modal_title, field) = if action == ButtonAction::EditTitle {
            (
                "Edit title",
                TextField {
                    custom_id: TITLE_FIELD.to_owned(),
                    label: "Title".to_owned(),
                    value: truncate(&title, TITLE_MAX_LENGTH),
                    max_length: TITLE_MAX_LENGTH,
                    paragraph: false,
                },
            )
        } else {
            (
                "Edit description",
                TextField {
                    custom_id: DESCRIPTION_FIELD.to_owned(),
                    label: "Description".to_owned(),
                    value: truncate(&description, DESCRIPTION_MAX_LENGTH),
                    max_length: DESCRIPTION_MAX_LENGTH,
                    paragraph: true,
                },
            )
        };
        Ok(InteractionResponse::Modal {
            custom_id,
            title: modal_title.to_owned(),
            field,
        })
    }

    async fn follow_up(&self, token: &str, text: String) {
        let message = OutgoingMessage::text(text).ephemeral();
        if let Err(error) = self.chat.send_interaction_followup(token, &message).await {
            tracing::warn!(%error, "interaction follow-up failed");
        }
    }
}

fn edit_confirmation(target: &PullRequestRef, edit: &PullRequestEdit) -> String {
    if edit.title.is_some() {
        format!("Updated the title of {target}.")
    } else {
        format!("Updated the description of {target}.")
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
