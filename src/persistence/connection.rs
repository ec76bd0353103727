//! Shared `SQLite` connection setup.

use diesel::Connection;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use super::PersistenceError;

const BUSY_TIMEOUT_MILLIS: u32 = 5_000;

/// Validates a database URL, rejecting blank values.
pub(crate) fn validated_url(database_url: impl Into<String>) -> Result<String, PersistenceError> {
    let url = database_url.into();
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }
    Ok(trimmed.to_owned())
}

/// Opens a connection with foreign keys enforced and a busy timeout so
/// concurrent writers to the same row wait instead of failing.
pub(crate) fn establish(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    let mut connection = SqliteConnection::establish(database_url).map_err(|error| {
        PersistenceError::ConnectionFailed {
            message: error.to_string(),
        }
    })?;

    for pragma in [
        "PRAGMA foreign_keys = ON;".to_owned(),
        format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MILLIS};"),
    ] {
        sql_query(pragma)
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| PersistenceError::PragmaFailed {
                message: error.to_string(),
            })?;
    }

    Ok(connection)
}

fn table_exists(connection: &mut SqliteConnection, table: &str) -> Result<bool, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        count: i64,
    }

    let row: Row =
        sql_query("SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;")
            .bind::<Text, _>(table)
            .get_result(connection)?;

    Ok(row.count > 0)
}

/// Maps a Diesel error, reporting a missing table as
/// [`PersistenceError::SchemaNotInitialised`].
pub(crate) fn map_error_with_schema_check<F>(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
    create_error: F,
) -> PersistenceError
where
    F: Fn(String) -> PersistenceError,
{
    match table_exists(connection, table) {
        Ok(false) => PersistenceError::SchemaNotInitialised,
        Ok(true) => create_error(error.to_string()),
        Err(check_error) => create_error(format!(
            "schema presence check failed: {check_error}; original error: {error}"
        )),
    }
}

pub(crate) fn map_query_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, table, error, |message| {
        PersistenceError::QueryFailed { message }
    })
}

pub(crate) fn map_write_error(
    connection: &mut SqliteConnection,
    table: &str,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, table, error, |message| {
        PersistenceError::WriteFailed { message }
    })
}

/// Converts an unsigned id into Diesel's `BigInt` binding.
pub(crate) fn to_i64(value: u64, what: &str) -> Result<i64, PersistenceError> {
    i64::try_from(value).map_err(|_| PersistenceError::WriteFailed {
        message: format!("{what} {value} does not fit in a signed 64-bit column"),
    })
}

/// Converts a stored `BigInt` back into an unsigned id.
pub(crate) fn to_u64(value: i64, what: &str) -> Result<u64, PersistenceError> {
    u64::try_from(value).map_err(|_| PersistenceError::CorruptRow {
        message: format!("{what} {value} is negative"),
    })
}
