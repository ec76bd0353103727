//! `SQLite` persistence and database migrations.
//!
//! Tracked pull request snapshots, linked GitHub accounts, and fork links
//! live in a local `SQLite` database. The schema is managed with append-only
//! Diesel migrations embedded in the binary.

mod connection;
mod error;
mod linked_accounts;
mod migrator;
mod mod_links;
mod snapshots;

pub use error::PersistenceError;
pub use linked_accounts::{LinkedAccountStore, TokenCipher};
pub use migrator::{
    CURRENT_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database,
};
pub use mod_links::{ModLink, ModLinkStore};
pub use snapshots::{SnapshotStore, SqliteSnapshotStore};

#[cfg(any(test, feature = "test-support"))]
pub use snapshots::InMemorySnapshotStore;

#[cfg(test)]
pub use snapshots::MockSnapshotStore;
