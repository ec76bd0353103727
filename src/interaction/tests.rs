//! Tests for button, modal, and endpoint handling.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ed25519_dalek::{Signer, SigningKey};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::{Value, json};

use super::{
    ComponentInteraction, FollowUp, Interaction, InteractionEndpoint, InteractionHandler,
    InteractionResponse, ModalSubmission, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::chat::{
    ButtonAction, ChannelId, ChatError, ChatGateway, ComponentLifespan, ComponentToken, MessageId,
    MockChatGateway, ThreadId, UserId,
};
use crate::github::models::test_support::open_pull_request;
use crate::github::models::{
    IssueComment, NewPullRequest, PullRequestCommit, PullRequestEdit,
};
use crate::github::{
    GitHubError, Label, MockPullRequestGateway, PullRequest, PullRequestGateway, PullRequestRef,
    RepositorySlug,
};
use crate::persistence::InMemorySnapshotStore;
use crate::sync::PullRequestTracker;
use crate::tracking::{PullRequestSnapshot, PullRequestState, TrackedSet};

const THREAD: ThreadId = ThreadId::new(900);
const CHANNEL: ChannelId = ChannelId::new(100);
const SUBMITTER: UserId = UserId::new(1234);

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("fixed timestamp should be valid")
}

fn reference() -> PullRequestRef {
    PullRequestRef::parse("acme/widget", 42).expect("reference should parse")
}

fn snapshot() -> PullRequestSnapshot {
    PullRequestSnapshot {
        comment_count: 2,
        commit_count: 1,
        labels: BTreeSet::from([1]),
        title: "Add widget".to_owned(),
        description: "Body".to_owned(),
        state: Some(PullRequestState::Open),
        ..PullRequestSnapshot::bare(reference(), THREAD)
    }
}

fn token(action: ButtonAction, lifespan: ComponentLifespan) -> String {
    ComponentToken::issue(action, reference(), lifespan, now())
        .encode()
        .expect("token should encode")
}

fn handler_with(
    snapshots: Vec<PullRequestSnapshot>,
    github: Arc<dyn PullRequestGateway>,
    chat: MockChatGateway,
) -> InteractionHandler {
    let store = Arc::new(InMemorySnapshotStore::with_snapshots(snapshots));
    let tracked = Arc::new(TrackedSet::load(store).expect("load should succeed"));
    let chat: Arc<dyn ChatGateway> = Arc::new(chat);
    let tracker = Arc::new(PullRequestTracker::new(
        Arc::clone(&tracked),
        Arc::clone(&github),
        Arc::clone(&chat),
        CHANNEL,
        "inquisition",
    ));
    InteractionHandler::new(tracked, tracker, github, chat)
}

fn click(custom_id: String) -> Interaction {
    Interaction::Component(ComponentInteraction {
        token: "interaction-token".to_owned(),
        channel: THREAD.as_channel(),
        custom_id,
    })
}

fn submit(custom_id: String, field: &str, value: &str) -> Interaction {
    Interaction::ModalSubmit(ModalSubmission {
        token: "interaction-token".to_owned(),
        channel: THREAD.as_channel(),
        custom_id,
        values: BTreeMap::from([(field.to_owned(), value.to_owned())]),
        user: Some(SUBMITTER),
    })
}

/// Records follow-up messages sent through a mocked gateway.
#[derive(Debug, Clone, Default)]
struct FollowUps(Arc<Mutex<Vec<String>>>);

impl FollowUps {
    fn install(&self, chat: &mut MockChatGateway) {
        let recorded = self.clone();
        chat.expect_send_interaction_followup()
            .withf(|token, message| token == "interaction-token" && message.ephemeral)
            .returning(move |_, message| {
                recorded
                    .0
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message.content.clone().unwrap_or_default());
                Ok(())
            });
    }

    fn texts(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn ephemeral_text(response: &InteractionResponse) -> Option<String> {
    match response {
        InteractionResponse::Message(message) if message.ephemeral => message.content.clone(),
        _ => None,
    }
}

mod buttons {
    use super::*;

    #[tokio::test]
    async fn expired_button_is_answered_with_an_ephemeral_notice() {
        let handler = handler_with(
            vec![snapshot()],
            Arc::new(MockPullRequestGateway::new()),
            MockChatGateway::new(),
        );
        let stale = token(ButtonAction::EditTitle, ComponentLifespan::Temporary);

        let (response, follow_up) = handler
            .respond(click(stale), now() + chrono::Duration::hours(1))
            .await;

        assert_eq!(
            ephemeral_text(&response).as_deref(),
            Some("This button has expired. Run the command again.")
        );
        assert!(follow_up.is_none());
    }

    #[tokio::test]
    async fn garbage_custom_id_is_rejected_without_follow_up() {
        let handler = handler_with(
            Vec::new(),
            Arc::new(MockPullRequestGateway::new()),
            MockChatGateway::new(),
        );

        let (response, follow_up) = handler.respond(click("nonsense".to_owned()), now()).await;

        assert_eq!(
            ephemeral_text(&response).as_deref(),
            Some("This button is no longer valid.")
        );
        assert!(follow_up.is_none());
    }

    #[tokio::test]
    async fn relink_is_deferred_against_the_clicked_thread() {
        let handler = handler_with(
            Vec::new(),
            Arc::new(MockPullRequestGateway::new()),
            MockChatGateway::new(),
        );
        let relink = token(ButtonAction::Relink, ComponentLifespan::Permanent);

        let (response, follow_up) = handler.respond(click(relink), now()).await;

        assert_eq!(response, InteractionResponse::DeferredUpdate);
        assert_eq!(
            follow_up,
            Some(FollowUp::Relink {
                token: "interaction-token".to_owned(),
                thread: THREAD,
                target: reference(),
            })
        );
    }

    #[tokio::test]
    async fn edit_title_prefills_from_stored_snapshot() {
        let mut github = MockPullRequestGateway::new();
        github.expect_pull_request().times(0);
        let handler = handler_with(vec![snapshot()], Arc::new(github), MockChatGateway::new());
        let edit = token(ButtonAction::EditTitle, ComponentLifespan::Permanent);

        let (response, follow_up) = handler.respond(click(edit), now()).await;

        let InteractionResponse::Modal {
            custom_id,
            title,
            field,
        } = response
        else {
            panic!("expected a modal");
        };
        assert_eq!(title, "Edit title");
        assert_eq!(field.custom_id, "title");
        assert_eq!(field.value, "Add widget");
        assert!(!field.paragraph);
        assert!(follow_up.is_none());

        let modal_token = ComponentToken::decode(&custom_id, now()).expect("modal token decodes");
        assert_eq!(modal_token.action(), ButtonAction::EditTitle);
        assert_eq!(
            modal_token.expires_at(),
            Some(now() + chrono::Duration::minutes(30))
        );
    }

    #[tokio::test]
    async fn edit_description_falls_back_to_live_pull_request_and_truncates() {
        let mut github = MockPullRequestGateway::new();
        github.expect_pull_request().times(1).returning(|_| {
            Ok(PullRequest {
                body: Some("é".repeat(4100)),
                ..open_pull_request(42, "Add widget")
            })
        });
        let handler = handler_with(Vec::new(), Arc::new(github), MockChatGateway::new());
        let edit = token(ButtonAction::EditDescription, ComponentLifespan::Permanent);

        let (response, _) = handler.respond(click(edit), now()).await;

        let InteractionResponse::Modal { field, .. } = response else {
            panic!("expected a modal");
        };
        assert_eq!(field.custom_id, "description");
        assert_eq!(field.value.chars().count(), 4000);
        assert_eq!(field.max_length, 4000);
        assert!(field.paragraph);
    }

    #[tokio::test]
    async fn missing_pull_request_is_reported_to_the_user() {
        let mut github = MockPullRequestGateway::new();
        github.expect_pull_request().returning(|_| {
            Err(GitHubError::NotFound {
                message: "Not Found".to_owned(),
            })
        });
        let handler = handler_with(Vec::new(), Arc::new(github), MockChatGateway::new());
        let edit = token(ButtonAction::EditTitle, ComponentLifespan::Permanent);

        let (response, _) = handler.respond(click(edit), now()).await;

        assert_eq!(
            ephemeral_text(&response).as_deref(),
            Some("The pull request could not be found on GitHub.")
        );
    }
}

mod modals {
    use super::*;

    #[tokio::test]
    async fn title_submission_defers_a_github_edit() {
        let handler = handler_with(
            Vec::new(),
            Arc::new(MockPullRequestGateway::new()),
            MockChatGateway::new(),
        );
        let custom_id = token(ButtonAction::EditTitle, ComponentLifespan::Temporary);

        let (response, follow_up) = handler
            .respond(submit(custom_id, "title", "Better title"), now())
            .await;

        assert_eq!(response, InteractionResponse::DeferredEphemeral);
        assert_eq!(
            follow_up,
            Some(FollowUp::Edit {
                token: "interaction-token".to_owned(),
                target: reference(),
                edit: PullRequestEdit {
                    title: Some("Better title".to_owned()),
                    body: None,
                },
                user: Some(SUBMITTER),
            })
        );
    }

    #[tokio::test]
    async fn submission_missing_its_field_is_rejected() {
        let handler = handler_with(
            Vec::new(),
            Arc::new(MockPullRequestGateway::new()),
            MockChatGateway::new(),
        );
        let custom_id = token(ButtonAction::EditDescription, ComponentLifespan::Temporary);

        let (response, follow_up) = handler
            .respond(submit(custom_id, "title", "wrong field"), now())
            .await;

        assert!(ephemeral_text(&response).is_some());
        assert!(follow_up.is_none());
    }

    #[tokio::test]
    async fn successful_edit_is_acknowledged() {
        let mut github = MockPullRequestGateway::new();
        github
            .expect_update_pull_request()
            .withf(|target, edit| {
                *target == reference() && edit.body.as_deref() == Some("New body")
            })
            .times(1)
            .returning(|_, _| Ok(open_pull_request(42, "Add widget")));
        let mut chat = MockChatGateway::new();
        let follow_ups = FollowUps::default();
        follow_ups.install(&mut chat);
        let handler = handler_with(Vec::new(), Arc::new(github), chat);

        handler
            .complete(FollowUp::Edit {
                token: "interaction-token".to_owned(),
                target: reference(),
                edit: PullRequestEdit {
                    title: None,
                    body: Some("New body".to_owned()),
                },
                user: None,
            })
            .await;

        assert_eq!(
            follow_ups.texts(),
            vec!["Updated the description of acme/widget#42.".to_owned()]
        );
    }

    #[tokio::test]
    async fn failed_edit_is_reported_not_propagated() {
        let mut github = MockPullRequestGateway::new();
        github.expect_update_pull_request().returning(|_, _| {
            Err(GitHubError::Authentication {
                message: "Bad credentials".to_owned(),
            })
        });
        let mut chat = MockChatGateway::new();
        let follow_ups = FollowUps::default();
        follow_ups.install(&mut chat);
        let handler = handler_with(Vec::new(), Arc::new(github), chat);

        handler
            .complete(FollowUp::Edit {
                token: "interaction-token".to_owned(),
                target: reference(),
                edit: PullRequestEdit {
                    title: Some("New".to_owned()),
                    body: None,
                },
                user: None,
            })
            .await;

        assert_eq!(
            follow_ups.texts(),
            vec!["GitHub refused the change. Check the bot's permissions.".to_owned()]
        );
    }

    #[tokio::test]
    async fn failed_relink_is_reported_to_the_user() {
        let mut github = MockPullRequestGateway::new();
        github
            .expect_pull_request()
            .returning(|_| Ok(open_pull_request(42, "Add widget")));
        let mut chat = MockChatGateway::new();
        chat.expect_set_thread_archived().returning(|_, _| {
            Err(ChatError::Api {
                status: 403,
                message: "Missing Access".to_owned(),
            })
        });
        let follow_ups = FollowUps::default();
        follow_ups.install(&mut chat);
        let handler = handler_with(Vec::new(), Arc::new(github), chat);

        handler
            .complete(FollowUp::Relink {
                token: "interaction-token".to_owned(),
                thread: THREAD,
                target: reference(),
            })
            .await;

        assert_eq!(
            follow_ups.texts(),
            vec!["Something went wrong while handling this action.".to_owned()]
        );
    }
}

mod linked_accounts {
    use tempfile::TempDir;

    use super::*;
    use crate::persistence::{LinkedAccountStore, TokenCipher, migrate_database};
    use crate::telemetry::NoopTelemetrySink;

    fn accounts() -> (TempDir, LinkedAccountStore) {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let database_url = temp_dir
            .path()
            .join("inquisitor.sqlite")
            .to_string_lossy()
            .to_string();
        migrate_database(&database_url, &NoopTelemetrySink).expect("migration should succeed");
        let cipher = TokenCipher::from_password("hunter22").expect("cipher should build");
        let store = LinkedAccountStore::new(database_url, cipher).expect("store should build");
        (temp_dir, store)
    }

    fn title_edit(user: Option<UserId>) -> FollowUp {
        FollowUp::Edit {
            token: "interaction-token".to_owned(),
            target: reference(),
            edit: PullRequestEdit {
                title: Some("New".to_owned()),
                body: None,
            },
            user,
        }
    }

    fn editing_gateway() -> MockPullRequestGateway {
        let mut github = MockPullRequestGateway::new();
        github
            .expect_update_pull_request()
            .times(1)
            .returning(|_, _| Ok(open_pull_request(42, "New")));
        github
    }

    fn idle_gateway() -> MockPullRequestGateway {
        let mut github = MockPullRequestGateway::new();
        github.expect_update_pull_request().times(0);
        github
    }

    #[tokio::test]
    async fn linked_user_edits_with_their_own_token() {
        let (_temp_dir, store) = accounts();
        store
            .store_token(SUBMITTER, "gho_submitter")
            .expect("store should succeed");
        let connected = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&connected);
        let mut chat = MockChatGateway::new();
        let follow_ups = FollowUps::default();
        follow_ups.install(&mut chat);
        let handler = handler_with(Vec::new(), Arc::new(idle_gateway()), chat)
            .with_linked_accounts(store, move |token| {
                recorder
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(token.value().to_owned());
                Ok(Arc::new(editing_gateway()) as Arc<dyn PullRequestGateway>)
            });

        handler.complete(title_edit(Some(SUBMITTER))).await;

        assert_eq!(
            *connected.lock().unwrap_or_else(PoisonError::into_inner),
            vec!["gho_submitter".to_owned()]
        );
        assert_eq!(
            follow_ups.texts(),
            vec!["Updated the title of acme/widget#42.".to_owned()]
        );
    }

    #[tokio::test]
    async fn unlinked_user_edits_as_the_bot() {
        let (_temp_dir, store) = accounts();
        let mut chat = MockChatGateway::new();
        let follow_ups = FollowUps::default();
        follow_ups.install(&mut chat);
        let handler = handler_with(Vec::new(), Arc::new(editing_gateway()), chat)
            .with_linked_accounts(store, |_| {
                Ok(Arc::new(idle_gateway()) as Arc<dyn PullRequestGateway>)
            });

        handler.complete(title_edit(Some(SUBMITTER))).await;

        assert_eq!(
            follow_ups.texts(),
            vec!["Updated the title of acme/widget#42.".to_owned()]
        );
    }
}

mod endpoint {
    use super::*;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7; 32])
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    fn endpoint_with(handler: InteractionHandler, deadline: Duration) -> InteractionEndpoint {
        let public_key = hex(&signing_key().verifying_key().to_bytes());
        InteractionEndpoint::new(&public_key, Arc::new(handler), deadline)
            .expect("public key should be accepted")
    }

    fn signed_headers(body: &[u8]) -> HeaderMap {
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = signing_key().sign(&message);

        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&hex(&signature.to_bytes())).expect("hex is a valid header"),
        );
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static("1700000000"));
        headers
    }

    fn idle_handler() -> InteractionHandler {
        handler_with(
            Vec::new(),
            Arc::new(MockPullRequestGateway::new()),
            MockChatGateway::new(),
        )
    }

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).expect("response should be JSON")
    }

    #[test]
    fn rejects_malformed_public_key() {
        let result = InteractionEndpoint::new("abcd", Arc::new(idle_handler()), Duration::ZERO);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unsigned_request_is_unauthorised() {
        let endpoint = endpoint_with(idle_handler(), Duration::from_secs(3));

        let (status, _) = endpoint.handle(&HeaderMap::new(), br#"{"type":1}"#).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signature_over_another_body_is_unauthorised() {
        let endpoint = endpoint_with(idle_handler(), Duration::from_secs(3));
        let headers = signed_headers(br#"{"type":1}"#);

        let (status, _) = endpoint.handle(&headers, br#"{"type":2}"#).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_ping_is_answered_with_pong() {
        let endpoint = endpoint_with(idle_handler(), Duration::from_secs(3));
        let body = br#"{"type":1}"#;

        let (status, response) = endpoint.handle(&signed_headers(body), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&response), json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn unsupported_type_is_a_bad_request() {
        let endpoint = endpoint_with(idle_handler(), Duration::from_secs(3));
        let body = br#"{"type":2,"token":"t"}"#;

        let (status, _) = endpoint.handle(&signed_headers(body), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn relink_click_is_acknowledged_then_completed_in_the_background() {
        let mut github = MockPullRequestGateway::new();
        github
            .expect_pull_request()
            .returning(|_| Ok(open_pull_request(42, "Add widget")));
        let mut chat = MockChatGateway::new();
        chat.expect_set_thread_archived()
            .withf(|thread, archived| *thread == THREAD && !archived)
            .returning(|_, _| Ok(()));
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let done = Mutex::new(Some(done_tx));
        chat.expect_send_message()
            .withf(|channel, _| *channel == THREAD.as_channel())
            .returning(move |_, _| {
                if let Some(sender) = done.lock().unwrap_or_else(PoisonError::into_inner).take() {
                    sender.send(()).ok();
                }
                Ok(MessageId::new(5))
            });
        let store = Arc::new(InMemorySnapshotStore::default());
        let tracked = Arc::new(TrackedSet::load(store.clone()).expect("load should succeed"));
        let github: Arc<dyn PullRequestGateway> = Arc::new(github);
        let chat: Arc<dyn ChatGateway> = Arc::new(chat);
        let tracker = Arc::new(PullRequestTracker::new(
            Arc::clone(&tracked),
            Arc::clone(&github),
            Arc::clone(&chat),
            CHANNEL,
            "inquisition",
        ));
        let handler = InteractionHandler::new(Arc::clone(&tracked), tracker, github, chat);
        let endpoint = endpoint_with(handler, Duration::from_secs(3));
        let body = json!({
            "type": 3,
            "token": "interaction-token",
            "channel_id": "900",
            "data": { "custom_id": token(ButtonAction::Relink, ComponentLifespan::Permanent) }
        })
        .to_string();

        let (status, response) = endpoint
            .handle(&signed_headers(body.as_bytes()), body.as_bytes())
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse(&response), json!({ "type": 6 }));
        tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("relink should finish")
            .expect("confirmation should be sent");
        assert_eq!(tracked.thread_for(&reference()), Some(THREAD));
    }

    /// Gateway whose reads take longer than the response window.
    struct SlowGateway;

    #[async_trait]
    impl PullRequestGateway for SlowGateway {
        async fn pull_request(
            &self,
            _reference: &PullRequestRef,
        ) -> Result<PullRequest, GitHubError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(open_pull_request(42, "Add widget"))
        }

        async fn issue_comments(
            &self,
            _reference: &PullRequestRef,
            _skip: u64,
        ) -> Result<Vec<IssueComment>, GitHubError> {
            Ok(Vec::new())
        }

        async fn pull_request_commits(
            &self,
            _reference: &PullRequestRef,
            _skip: u64,
        ) -> Result<Vec<PullRequestCommit>, GitHubError> {
            Ok(Vec::new())
        }

        async fn repository_labels(
            &self,
            _repo: &RepositorySlug,
        ) -> Result<Vec<Label>, GitHubError> {
            Ok(Vec::new())
        }

        async fn update_pull_request(
            &self,
            _reference: &PullRequestRef,
            _edit: &PullRequestEdit,
        ) -> Result<PullRequest, GitHubError> {
            Ok(open_pull_request(42, "Add widget"))
        }

        async fn create_pull_request(
            &self,
            _repo: &RepositorySlug,
            _request: &NewPullRequest,
        ) -> Result<PullRequest, GitHubError> {
            Ok(open_pull_request(42, "Add widget"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_answer_is_cut_off_at_the_deadline() {
        let handler = handler_with(Vec::new(), Arc::new(SlowGateway), MockChatGateway::new());
        let endpoint = endpoint_with(handler, Duration::from_secs(3));
        let body = json!({
            "type": 3,
            "token": "interaction-token",
            "channel_id": "900",
            "data": { "custom_id": token(ButtonAction::EditTitle, ComponentLifespan::Permanent) }
        })
        .to_string();

        let (status, response) = endpoint
            .handle(&signed_headers(body.as_bytes()), body.as_bytes())
            .await;

        assert_eq!(status, StatusCode::OK);
        let payload = parse(&response);
        assert_eq!(payload["type"], 4);
        assert_eq!(payload["data"]["flags"], 64);
    }
}
