/// Table Browser Error Module
///
/// This module defines the error taxonomy for the table browser backend.
/// Every failure carries a distinguishable kind and a human-readable message
/// so the calling UI layer can decide how to present it.
use thiserror::Error;

/// Error type for the table browser backend.
///
/// The first four variants are the domain failures callers are expected to
/// branch on:
/// - `Connection`: the store could not be opened or configured
/// - `TableNotFound`: the named table is absent from the catalog
/// - `SchemaMismatch`: the schema probe and the row scan disagree
/// - `Query`: a statement was malformed, rejected, or used an identifier
///   outside the discovered schema
///
/// The rest wrap lower-level failures from the ambient stack.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// The database file could not be opened or its pragmas applied
    #[error("Connection error: {0}")]
    Connection(String),

    /// The requested table does not exist in the current database
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column counts from the schema probe and the row scan differ
    #[error("Schema mismatch on table '{table}': schema lists {expected} columns, scan returned {actual}")]
    SchemaMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// Malformed or rejected statements and untrusted identifiers
    #[error("Query error: {0}")]
    Query(String),

    /// Uncategorised SQLite failures
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported or failed output formatting
    #[error("Export error: {0}")]
    Export(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use BrowserError as the error type.
pub type Result<T> = std::result::Result<T, BrowserError>;
