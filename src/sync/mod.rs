//! Reconciliation of tracked pull requests against GitHub.
//!
//! [`DiffNotifyEngine`] turns the difference between a stored snapshot and
//! the live pull request into thread notifications, [`SyncScheduler`]
//! drives it over the whole tracked set, and [`PullRequestTracker`] starts
//! and stops tracking.

pub mod engine;
pub mod error;
pub mod scheduler;
pub mod tracker;

pub use engine::{DiffNotifyEngine, ReconcileOutcome};
pub use error::SyncError;
pub use scheduler::{CycleReport, SyncScheduler};
pub use tracker::{PullRequestDraft, PullRequestTracker};

#[cfg(test)]
mod tests;
