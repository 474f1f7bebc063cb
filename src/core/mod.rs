/// Core Module for the table browser
///
/// Shared infrastructure for the backend: the error taxonomy and the
/// database layer (connection lifetime, schema discovery, table access).

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{BrowserError, Result};
