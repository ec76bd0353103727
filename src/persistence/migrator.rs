//! Diesel-backed migration runner for the `SQLite` database.

use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::PersistenceError;
use super::connection::{establish, validated_url};

/// Embedded Diesel migrations shipped with the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Schema version recorded by the first migration.
pub const INITIAL_SCHEMA_VERSION: &str = "20260110000000";

/// Schema version recorded by the latest migration.
pub const CURRENT_SCHEMA_VERSION: &str = "20260110000200";

/// A Diesel migration version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Returns the inner version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Runs pending database migrations and records the resulting schema version
/// in telemetry.
///
/// Migrations only ever append; existing tables are never dropped.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the database cannot be opened, migrations
/// fail, or the resulting schema version cannot be read.
pub fn migrate_database(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SchemaVersion, PersistenceError> {
    let url = validated_url(database_url)?;
    let mut connection = establish(&url)?;

    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| PersistenceError::MigrationFailed {
            message: error.to_string(),
        })?;

    let schema_version = read_schema_version(&mut connection)?;
    telemetry.record(TelemetryEvent::SchemaVersionRecorded {
        schema_version: schema_version.as_str().to_owned(),
    });

    Ok(schema_version)
}

fn read_schema_version(
    connection: &mut SqliteConnection,
) -> Result<SchemaVersion, PersistenceError> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = Text)]
        version: String,
    }

    let result: Option<Row> =
        sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version DESC LIMIT 1;")
            .get_result(connection)
            .optional()
            .map_err(|error| PersistenceError::SchemaVersionQueryFailed {
                message: error.to_string(),
            })?;

    let Some(row) = result else {
        return Err(PersistenceError::MissingSchemaVersion);
    };

    Ok(SchemaVersion(row.version))
}
