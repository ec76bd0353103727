//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned while migrating or querying the `SQLite` database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// No database URL/path was provided.
    #[error("database URL is required (use --database-url or INQUISITOR_DATABASE_URL)")]
    MissingDatabaseUrl,

    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Applying connection pragmas failed.
    #[error("failed to configure SQLite connection: {message}")]
    PragmaFailed {
        /// Error detail from the PRAGMA execution.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The required tables do not exist; run migrations first.
    #[error("database schema is not initialised; run with --migrate-db")]
    SchemaNotInitialised,

    /// A read query failed.
    #[error("database query failed: {message}")]
    QueryFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A write failed.
    #[error("database write failed: {message}")]
    WriteFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A stored row could not be turned back into a domain value.
    #[error("stored row is corrupt: {message}")]
    CorruptRow {
        /// Description of the offending value.
        message: String,
    },

    /// Encrypting or decrypting a stored secret failed.
    #[error("token encryption failed: {message}")]
    Encryption {
        /// Failure detail.
        message: String,
    },
}
