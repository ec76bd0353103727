//! Shared fixtures for sync tests.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::chat::{ChannelId, MessageId, MockChatGateway, OutgoingMessage, ThreadId, ThreadInfo};
use crate::github::models::HeadBranch;
use crate::github::models::test_support::{label, open_pull_request};
use crate::github::{PullRequest, PullRequestRef};
use crate::persistence::InMemorySnapshotStore;
use crate::tracking::{PullRequestSnapshot, PullRequestState, TrackedPullRequest, TrackedSet};

pub const THREAD: ThreadId = ThreadId::new(900);
pub const CHANNEL: ChannelId = ChannelId::new(100);

pub fn reference() -> PullRequestRef {
    PullRequestRef::parse("acme/widget", 42).expect("reference should parse")
}

pub fn entry() -> TrackedPullRequest {
    TrackedPullRequest {
        reference: reference(),
        thread: THREAD,
    }
}

/// Snapshot matching [`live`] exactly.
pub fn old_snapshot() -> PullRequestSnapshot {
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

/// Live pull request matching [`old_snapshot`] exactly.
pub fn live() -> PullRequest {
    PullRequest {
        body: Some("Body".to_owned()),
        comments: 2,
        commits: 1,
        labels: vec![label(1), label(2)],
        head: Some(HeadBranch {
            repository: "inquisition/widget".to_owned(),
            branch: "feature-x".to_owned(),
        }),
        ..open_pull_request(42, "Add widget")
    }
}

pub fn tracked_with(
    snapshots: impl IntoIterator<Item = PullRequestSnapshot>,
) -> (Arc<InMemorySnapshotStore>, Arc<TrackedSet>) {
    let store = Arc::new(InMemorySnapshotStore::with_snapshots(snapshots));
    let tracked = TrackedSet::load(store.clone()).expect("load should succeed");
    (store, Arc::new(tracked))
}

pub fn thread_info() -> ThreadInfo {
    ThreadInfo {
        id: THREAD,
        parent: Some(CHANNEL),
        name: "widget [42]".to_owned(),
        archived: false,
    }
}

/// Captures every message sent through a mocked chat gateway.
#[derive(Debug, Clone, Default)]
pub struct Sent(Arc<Mutex<Vec<(ChannelId, OutgoingMessage)>>>);

impl Sent {
    pub fn install(&self, chat: &mut MockChatGateway) {
        let sent = self.clone();
        chat.expect_send_message().returning(move |channel, message| {
            sent.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((channel, message.clone()));
            Ok(MessageId::new(1))
        });
    }

    pub fn messages(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Title of the first embed of each message, or its text content.
    pub fn headlines(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|(_, message)| {
                message
                    .embeds
                    .first()
                    .and_then(|embed| embed.title.clone())
                    .or(message.content)
                    .unwrap_or_default()
            })
            .collect()
    }
}
