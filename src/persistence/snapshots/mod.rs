//! Durable store of tracked pull request snapshots.
//!
//! Each row holds the full snapshot for one `(repo, number)` pair and is
//! independently addressable by thread id. Writes always replace the whole
//! record.

#[cfg(any(test, feature = "test-support"))]
mod memory;


#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemorySnapshotStore;

use std::collections::BTreeSet;

use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Integer, Text};

use crate::chat::ThreadId;
use crate::github::{PullRequestNumber, PullRequestRef, RepositorySlug};
use crate::tracking::{PullRequestSnapshot, PullRequestState};

use super::PersistenceError;
use super::connection::{
    establish, map_query_error, map_write_error, to_i64, to_u64, validated_url,
};

const PULL_REQUESTS_TABLE: &str = "pull_requests";

const SELECT_COLUMNS: &str =
    "SELECT repo, number, thread, comments, labels, title, description, state, commits \
     FROM pull_requests";

/// Keyed storage for [`PullRequestSnapshot`]s.
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotStore: Send + Sync {
    /// Inserts or fully replaces the snapshot for its `(repo, number)`.
    ///
    /// Any other row bound to the same thread is removed in the same
    /// transaction so thread ids stay unique.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn upsert(&self, snapshot: &PullRequestSnapshot) -> Result<(), PersistenceError>;

    /// Looks up a snapshot by pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn get(
        &self,
        reference: &PullRequestRef,
    ) -> Result<Option<PullRequestSnapshot>, PersistenceError>;

    /// Looks up a snapshot by thread.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn get_by_thread(
        &self,
        thread: ThreadId,
    ) -> Result<Option<PullRequestSnapshot>, PersistenceError>;

    /// Lists every snapshot ordered by repository and number.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn list_all(&self) -> Result<Vec<PullRequestSnapshot>, PersistenceError>;

    /// Removes the snapshot bound to `thread`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn remove(&self, thread: ThreadId) -> Result<bool, PersistenceError>;
}

#[derive(Debug, QueryableByName)]
struct SnapshotRow {
    #[diesel(sql_type = Text)]
    repo: String,
    #[diesel(sql_type = BigInt)]
    number: i64,
    #[diesel(sql_type = BigInt)]
    thread: i64,
    #[diesel(sql_type = BigInt)]
    comments: i64,
    #[diesel(sql_type = Text)]
    labels: String,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Text)]
    description: String,
    #[diesel(sql_type = Integer)]
    state: i32,
    #[diesel(sql_type = BigInt)]
    commits: i64,
}

impl SnapshotRow {
    fn into_snapshot(self) -> Result<PullRequestSnapshot, PersistenceError> {
        let corrupt = |error: &dyn std::fmt::Display| PersistenceError::CorruptRow {
            message: error.to_string(),
        };
        let slug = RepositorySlug::parse(&self.repo).map_err(|error| corrupt(&error))?;
        let reference = PullRequestRef::new(
            slug,
            PullRequestNumber::new(to_u64(self.number, "number")?)
                .map_err(|error| corrupt(&error))?,
        );
        let labels: BTreeSet<u64> =
            serde_json::from_str(&self.labels).map_err(|error| corrupt(&error))?;

        Ok(PullRequestSnapshot {
            reference,
            thread: ThreadId::new(to_u64(self.thread, "thread")?),
            comment_count: to_u64(self.comments, "comment count")?,
            commit_count: to_u64(self.commits, "commit count")?,
            labels,
            title: self.title,
            description: self.description,
            state: PullRequestState::from_ordinal(self.state),
        })
    }
}

/// SQLite-backed [`SnapshotStore`].
///
/// A connection is opened per operation; `SQLite`'s busy timeout serialises
/// writers to the same row.
#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    database_url: String,
}

impl SqliteSnapshotStore {
    /// Creates a store targeting `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        Ok(Self {
            database_url: validated_url(database_url)?,
        })
    }

    fn query(&self, filter: Filter<'_>) -> Result<Vec<PullRequestSnapshot>, PersistenceError> {
        let mut connection = establish(&self.database_url)?;
        let rows: Vec<SnapshotRow> = match filter {
            Filter::All => sql_query(format!("{SELECT_COLUMNS} ORDER BY repo, number;"))
                .load::<SnapshotRow>(&mut connection),
            Filter::Reference(reference) => {
                let number = to_i64(reference.number().get(), "number")?;
                sql_query(format!("{SELECT_COLUMNS} WHERE repo = ? AND number = ? LIMIT 1;"))
                    .bind::<Text, _>(reference.repo().full_name())
                    .bind::<BigInt, _>(number)
                    .load::<SnapshotRow>(&mut connection)
            }
            Filter::Thread(thread) => {
                let thread_id = to_i64(thread.get(), "thread")?;
                sql_query(format!("{SELECT_COLUMNS} WHERE thread = ? LIMIT 1;"))
                    .bind::<BigInt, _>(thread_id)
                    .load::<SnapshotRow>(&mut connection)
            }
        }
        .map_err(|error| map_query_error(&mut connection, PULL_REQUESTS_TABLE, &error))?;

        rows.into_iter().map(SnapshotRow::into_snapshot).collect()
    }
}

enum Filter<'a> {
    All,
    Reference(&'a PullRequestRef),
    Thread(ThreadId),
}

impl SnapshotStore for SqliteSnapshotStore {
    fn upsert(&self, snapshot: &PullRequestSnapshot) -> Result<(), PersistenceError> {
        let repo = snapshot.reference.repo().full_name();
        let number = to_i64(snapshot.reference.number().get(), "number")?;
        let thread = to_i64(snapshot.thread.get(), "thread")?;
        let comments = to_i64(snapshot.comment_count, "comment count")?;
        let commits = to_i64(snapshot.commit_count, "commit count")?;
        let labels =
            serde_json::to_string(&snapshot.labels).map_err(|error| PersistenceError::WriteFailed {
                message: error.to_string(),
            })?;
        let state = snapshot.state.map_or(0, PullRequestState::ordinal);

        let mut connection = establish(&self.database_url)?;
        connection
            .immediate_transaction(|transaction| {
                sql_query(
                    "DELETE FROM pull_requests \
                     WHERE thread = ? AND NOT (repo = ? AND number = ?);",
                )
                .bind::<BigInt, _>(thread)
                .bind::<Text, _>(&repo)
                .bind::<BigInt, _>(number)
                .execute(transaction)?;

                sql_query(
                    "INSERT INTO pull_requests \
                     (repo, number, thread, comments, labels, title, description, state, commits) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT(repo, number) DO UPDATE SET \
                       thread = excluded.thread, \
                       comments = excluded.comments, \
                       labels = excluded.labels, \
                       title = excluded.title, \
                       description = excluded.description, \
                       state = excluded.state, \
                       commits = excluded.commits, \
                       updated_at = CURRENT_TIMESTAMP;",
                )
                .bind::<Text, _>(&repo)
                .bind::<BigInt, _>(number)
                .bind::<BigInt, _>(thread)
                .bind::<BigInt, _>(comments)
                .bind::<Text, _>(&labels)
                .bind::<Text, _>(&snapshot.title)
                .bind::<Text, _>(&snapshot.description)
                .bind::<Integer, _>(state)
                .bind::<BigInt, _>(commits)
                .execute(transaction)
                .map(drop)
            })
            .map_err(|error| map_write_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }

    fn get(
        &self,
        reference: &PullRequestRef,
    ) -> Result<Option<PullRequestSnapshot>, PersistenceError> {
        Ok(self.query(Filter::Reference(reference))?.into_iter().next())
    }

    fn get_by_thread(
        &self,
        thread: ThreadId,
    ) -> Result<Option<PullRequestSnapshot>, PersistenceError> {
        Ok(self.query(Filter::Thread(thread))?.into_iter().next())
    }

    fn list_all(&self) -> Result<Vec<PullRequestSnapshot>, PersistenceError> {
        self.query(Filter::All)
    }

    fn remove(&self, thread: ThreadId) -> Result<bool, PersistenceError> {
        let thread_id = to_i64(thread.get(), "thread")?;
        let mut connection = establish(&self.database_url)?;
        sql_query("DELETE FROM pull_requests WHERE thread = ?;")
            .bind::<BigInt, _>(thread_id)
            .execute(&mut connection)
            .map(|affected| affected > 0)
            .map_err(|error| map_write_error(&mut connection, PULL_REQUESTS_TABLE, &error))
    }
}
