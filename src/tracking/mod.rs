//! Tracked pull requests and their last-observed snapshots.

mod snapshot;
mod state;
mod tracked_set;

pub use snapshot::{LabelDiff, PullRequestSnapshot, SnapshotChanges, StateTransition};
pub use state::PullRequestState;
pub use tracked_set::{TrackedPullRequest, TrackedSet, branch_key};
