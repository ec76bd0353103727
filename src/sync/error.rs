//! Errors raised while reconciling or (un)linking tracked pull requests.

use thiserror::Error;

use crate::chat::{ChatError, ThreadId};
use crate::github::{GitHubError, PullRequestRef};
use crate::persistence::PersistenceError;

/// Failure affecting one tracked pull request.
#[derive(Debug, Error)]
pub enum SyncError {
    /// GitHub could not be reached or rejected the request.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The chat platform could not be reached or rejected the request.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The snapshot store failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The pull request is already mirrored into a thread.
    #[error("{reference} is already tracked in thread {thread}")]
    AlreadyTracked {
        /// Pull request that was asked for.
        reference: PullRequestRef,
        /// Thread it is bound to.
        thread: ThreadId,
    },

    /// Nothing is tracked in the thread.
    #[error("thread {0} is not tracking a pull request")]
    NotTracked(ThreadId),
}
