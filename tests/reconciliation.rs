//! End-to-end reconciliation against a migrated `SQLite` store.

mod support;

use std::collections::BTreeSet;
use std::sync::Arc;

use inquisitor::chat::{ChannelId, ThreadId};
use inquisitor::github::models::test_support::{create_comments, label, open_pull_request};
use inquisitor::github::{PullRequest, PullRequestRef};
use inquisitor::persistence::{SnapshotStore, SqliteSnapshotStore, migrate_database};
use inquisitor::sync::{DiffNotifyEngine, ReconcileOutcome};
use inquisitor::telemetry::NoopTelemetrySink;
use inquisitor::tracking::{PullRequestSnapshot, PullRequestState, TrackedSet};
use tempfile::TempDir;

use support::{RecordingChat, StaticGitHub, create_temp_dir};

const THREAD: ThreadId = ThreadId::new(900);
const CHANNEL: ChannelId = ChannelId::new(100);

fn reference() -> PullRequestRef {
    PullRequestRef::parse("acme/widget", 42).expect("reference should parse")
}

fn stored_snapshot() -> PullRequestSnapshot {
    PullRequestSnapshot {
        comment_count: 2,
        commit_count: 1,
        labels: BTreeSet::from([1, 2]),
        title: "Add widget".to_owned(),
        description: "Body".to_owned(),
        state: Some(PullRequestState::Open),
        ..PullRequestSnapshot::bare(reference(), THREAD)
    }
}

fn github_with(pull_request: PullRequest) -> StaticGitHub {
    StaticGitHub {
        pull_request,
        comments: create_comments(3),
        commits: Vec::new(),
        labels: vec![label(1), label(2), label(3)],
    }
}

fn live() -> PullRequest {
    PullRequest {
        body: Some("Body".to_owned()),
        comments: 3,
        commits: 1,
        labels: vec![label(2), label(3)],
        ..open_pull_request(42, "Add widget")
    }
}

struct Harness {
    _temp_dir: TempDir,
    store: Arc<SqliteSnapshotStore>,
    tracked: Arc<TrackedSet>,
    chat: Arc<RecordingChat>,
    engine: DiffNotifyEngine,
}

fn harness(github: StaticGitHub) -> Harness {
    let temp_dir = create_temp_dir();
    let database_url = temp_dir
        .path()
        .join("inquisitor.sqlite")
        .to_string_lossy()
        .to_string();
    migrate_database(&database_url, &NoopTelemetrySink).expect("migration should succeed");
    let store = Arc::new(SqliteSnapshotStore::new(database_url).expect("store should build"));
    store
        .upsert(&stored_snapshot())
        .expect("seed snapshot should be written");

    let tracked = Arc::new(TrackedSet::load(store.clone()).expect("tracked set should load"));
    let chat = Arc::new(RecordingChat::new(CHANNEL));
    let engine = DiffNotifyEngine::new(
        Arc::clone(&tracked),
        Arc::new(github),
        chat.clone(),
        CHANNEL,
    );
    Harness {
        _temp_dir: temp_dir,
        store,
        tracked,
        chat,
        engine,
    }
}

#[tokio::test]
async fn one_new_comment_and_a_label_swap_post_two_notifications() {
    let harness = harness(github_with(live()));
    let entries = harness.tracked.entries();
    let entry = entries.first().expect("seeded pull request is tracked");

    let outcome = harness
        .engine
        .reconcile(entry)
        .await
        .expect("reconcile should succeed");

    assert_eq!(outcome, ReconcileOutcome::Updated);
    let sent = harness.chat.sent();
    assert_eq!(sent.len(), 2, "one comment and one label notification");
    assert!(sent.iter().all(|(channel, _)| *channel == THREAD.as_channel()));
    let first_title = sent
        .first()
        .and_then(|(_, message)| message.embeds.first())
        .and_then(|embed| embed.title.clone());
    assert_eq!(
        first_title.as_deref(),
        Some("New comment on pull request #42")
    );
    assert!(harness.chat.edited().is_empty(), "summary is unchanged");

    let persisted = harness
        .store
        .get(&reference())
        .expect("lookup should succeed")
        .expect("snapshot should exist");
    assert_eq!(persisted.comment_count, 3);
    assert_eq!(persisted.labels, BTreeSet::from([2, 3]));
}

#[tokio::test]
async fn second_pass_without_changes_is_silent() {
    let harness = harness(github_with(live()));
    let entries = harness.tracked.entries();
    let entry = entries.first().expect("seeded pull request is tracked");

    harness
        .engine
        .reconcile(entry)
        .await
        .expect("first pass should succeed");
    let outcome = harness
        .engine
        .reconcile(entry)
        .await
        .expect("second pass should succeed");

    assert_eq!(outcome, ReconcileOutcome::Unchanged);
    assert_eq!(harness.chat.sent().len(), 2);
}

#[tokio::test]
async fn merge_closes_out_and_untracks() {
    let merged = PullRequest {
        merged: true,
        state: inquisitor::github::IssueState::Closed,
        comments: 2,
        ..live()
    };
    let harness = harness(github_with(merged));
    let entries = harness.tracked.entries();
    let entry = entries.first().expect("seeded pull request is tracked");

    let outcome = harness
        .engine
        .reconcile(entry)
        .await
        .expect("reconcile should succeed");

    assert_eq!(outcome, ReconcileOutcome::Merged);
    assert!(harness.tracked.is_empty());
    assert_eq!(
        harness.store.get(&reference()).expect("lookup should succeed"),
        None
    );
    assert_eq!(
        harness.chat.edited(),
        vec![(CHANNEL, THREAD.starter_message())],
        "summary is refreshed with the merged state"
    );
}
