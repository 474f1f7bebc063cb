/// Database Module
///
/// The database layer is split into four concerns:
/// - **Connection Management** (`connection.rs`): one database at a time, open/switch/close
/// - **Schema Introspection** (`schema.rs`): catalog lookups and column discovery
/// - **Cell Values** (`value.rs`): typed values and their display text
/// - **Table Access** (`table.rs`): loading rows and keyed mutations for one table
///
/// ## Error Handling
///
/// All database operations use the standardized `BrowserError` type.
pub mod connection;
pub mod schema;
pub mod table;
pub mod value;

pub use connection::*;
pub use schema::*;
pub use table::*;
pub use value::*;
