//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the
//! underlying [`sqlx`] errors with context about which operation
//! failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row violates the progression schema (for example an
    /// unknown class name).
    #[error("Corrupt row for guild {guild_id} user {user_id}: {reason}")]
    CorruptRow {
        /// Guild key of the offending row.
        guild_id: i64,
        /// User key of the offending row.
        user_id: i64,
        /// What was wrong with the row.
        reason: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
