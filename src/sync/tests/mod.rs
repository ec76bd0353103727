//! Tests for reconciliation, scheduling, and tracking.
//!
//! - `support`: Shared fixtures and a message recorder
//! - `engine`: Diff and notification behaviour
//! - `scheduler`: Cycle pacing and isolation
//! - `tracker`: Link, create, unlink, and relink flows

mod support;
