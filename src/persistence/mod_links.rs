//! Links between organisation forks, mod projects, and archive issues.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};

use crate::github::RepositorySlug;

use super::PersistenceError;
use super::connection::{
    establish, map_query_error, map_write_error, to_i64, to_u64, validated_url,
};

const MODS_TABLE: &str = "mods";

/// Recorded link for a fork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModLink {
    /// Mod project id on the mod hosting site.
    pub project_id: u64,
    /// Tracking issue number in the archives repository.
    pub issue: u64,
}

/// Store of fork links keyed by lowercased repository.
#[derive(Debug, Clone)]
pub struct ModLinkStore {
    database_url: String,
}

impl ModLinkStore {
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

    /// Records or replaces the link for `fork`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    pub fn insert(&self, fork: &RepositorySlug, link: &ModLink) -> Result<(), PersistenceError> {
        let project_id = to_i64(link.project_id, "project id")?;
        let issue = to_i64(link.issue, "issue")?;
        let mut connection = establish(&self.database_url)?;
        sql_query("INSERT OR REPLACE INTO mods (fork, project_id, issue) VALUES (?, ?, ?);")
            .bind::<Text, _>(fork.key())
            .bind::<BigInt, _>(project_id)
            .bind::<BigInt, _>(issue)
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| map_write_error(&mut connection, MODS_TABLE, &error))
    }

    /// Returns the link recorded for `fork`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    pub fn get(&self, fork: &RepositorySlug) -> Result<Option<ModLink>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            project_id: i64,
            #[diesel(sql_type = BigInt)]
            issue: i64,
        }

        let mut connection = establish(&self.database_url)?;
        let row: Option<Row> =
            sql_query("SELECT project_id, issue FROM mods WHERE fork = ? LIMIT 1;")
                .bind::<Text, _>(fork.key())
                .get_result(&mut connection)
                .optional()
                .map_err(|error| map_query_error(&mut connection, MODS_TABLE, &error))?;

        row.map(|found| {
            Ok(ModLink {
                project_id: to_u64(found.project_id, "project id")?,
                issue: to_u64(found.issue, "issue")?,
            })
        })
        .transpose()
    }

    /// Returns the archive issue recorded for `fork`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    pub fn issue_for(&self, fork: &RepositorySlug) -> Result<Option<u64>, PersistenceError> {
        Ok(self.get(fork)?.map(|link| link.issue))
    }
}
