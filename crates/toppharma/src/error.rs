//! Error types for toppharma.
//!
//! This module defines all error types used throughout the toppharma crate,
//! providing detailed context for debugging and user-facing API responses.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for toppharma operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Query Errors ===
    /// A query referenced a column the table does not have.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// Table being queried.
        table: &'static str,
        /// The rejected column name.
        column: String,
    },

    /// A query was malformed (bad range, empty column list, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Data Source Errors ===
    /// The requested data source is not registered.
    #[error("data source '{kind}' is not registered")]
    SourceNotRegistered {
        /// The requested source kind.
        kind: String,
    },

    /// An unknown data source name was supplied.
    #[error("unknown data source type: {0}")]
    UnknownSource(String),

    // === Feature Flag Errors ===
    /// An unknown feature flag name was supplied.
    #[error("invalid feature flag: {0}")]
    UnknownFlag(String),

    /// A feature flag operation is refused in the current environment.
    #[error("{0}")]
    Forbidden(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for toppharma operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new invalid query error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Create an unknown column error for the given table.
    #[must_use]
    pub fn unknown_column(table: &'static str, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table,
            column: column.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error was caused by bad caller input rather than a fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownColumn { .. }
                | Self::InvalidQuery(_)
                | Self::UnknownSource(_)
                | Self::UnknownFlag(_)
        )
    }

    /// Check if this error means a requested thing does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotRegistered { .. })
    }
}
