//! Inquisitor library crate: GitHub pull request mirroring for chat threads.
//!
//! Each tracked pull request is bound to one chat thread. A periodic
//! reconciliation pass fetches the live pull request, diffs it against the
//! last stored snapshot, and posts one notification per changed dimension
//! (comments, commits, state, labels) before persisting the new snapshot.
//! Merged pull requests are closed out and untracked.
//!
//! Alongside the scheduler, an HTTP server accepts GitHub webhooks (push
//! digests for tracked head branches) and chat interactions (relink and
//! edit buttons).

pub mod chat;
pub mod config;
pub mod github;
pub mod interaction;
pub mod logging;
pub mod mods;
pub mod persistence;
pub mod render;
pub mod server;
pub mod sync;
pub mod telemetry;
pub mod tracking;
pub mod webhook;

pub use config::InquisitorConfig;
