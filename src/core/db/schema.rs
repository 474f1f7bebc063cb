/// Schema Introspection Module
///
/// Catalog lookups (table listing and existence) and column discovery for a
/// single table. Table names are always bound as parameters here; the
/// resulting `TableSchema` is the allow-list every caller-supplied column
/// name is checked against before it is quoted into SQL.

use crate::core::{BrowserError, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

const LIST_TABLES_SQL: &str = r"SELECT name FROM sqlite_master
     WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
     ORDER BY name";

const TABLE_EXISTS_SQL: &str = r"SELECT 1 FROM sqlite_master
     WHERE type = 'table' AND name = ?1 AND name NOT LIKE 'sqlite\_%' ESCAPE '\'";

// hidden: 0 ordinary, 1 hidden virtual-table column, 2/3 generated.
// `SELECT *` returns everything except hidden = 1.
const TABLE_INFO_SQL: &str = r#"SELECT cid, name, type, "notnull", dflt_value, pk, hidden
     FROM pragma_table_xinfo(?1)
     WHERE hidden <> 1
     ORDER BY cid"#;

/// Represents a table column with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Ordinal position in declaration order, starting at 0
    pub position: usize,
    /// Declared type name (may be empty for untyped columns)
    pub type_name: String,
    /// Whether the column is declared NOT NULL
    pub not_null: bool,
    /// 1-based position within the primary key, 0 when not part of it
    pub primary_key: u32,
    /// Default value expression (if any)
    pub default_value: Option<String>,
    /// Computed by a `GENERATED ALWAYS AS` expression; readable, not writable
    pub generated: bool,
}

impl Column {
    /// Creates a Column from a pragma_table_xinfo result row
    fn from_pragma_row(row: &Row, position: usize) -> rusqlite::Result<Self> {
        let hidden: i64 = row.get(6)?;
        Ok(Column {
            name: row.get(1)?,
            position,
            type_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            not_null: row.get(3)?,
            default_value: row.get(4)?,
            primary_key: row.get(5)?,
            generated: hidden >= 2,
        })
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }
}

/// The discovered column set of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Verifies the table exists and probes its columns.
    ///
    /// # Errors
    ///
    /// Returns `BrowserError::TableNotFound` if the catalog has no such table.
    pub fn probe(conn: &Connection, table: &str) -> Result<Self> {
        if !table_exists(conn, table)? {
            return Err(BrowserError::TableNotFound(table.to_string()));
        }
        let columns = table_columns(conn, table)?;
        Ok(TableSchema {
            name: table.to_string(),
            columns,
        })
    }

    /// Looks up a caller-supplied column name in the discovered schema.
    ///
    /// # Errors
    ///
    /// Returns `BrowserError::Query` when the name is not a column of this table.
    pub fn resolve(&self, column: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .ok_or_else(|| {
                BrowserError::Query(format!(
                    "Unknown column '{}' for table '{}'",
                    column, self.name
                ))
            })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns of the primary key, in key order
    pub fn primary_key(&self) -> Vec<&Column> {
        let mut key: Vec<&Column> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        key.sort_by_key(|c| c.primary_key);
        key
    }
}

/// Lists every user table in the database, ordered by name.
///
/// SQLite's internal `sqlite_*` tables are excluded. A NULL name is reported
/// as the empty string.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
    let names = stmt
        .query_map([], |row| row.get::<_, Option<String>>(0))?
        .map(|name| name.map(Option::unwrap_or_default))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!("Catalog lists {} tables", names.len());
    Ok(names)
}

/// Checks the catalog for a user table with exactly this name.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(TABLE_EXISTS_SQL, [table], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Retrieves column information for a table in declaration order.
///
/// The list matches what `SELECT *` returns, generated columns included.
/// An absent table yields an empty list; use `TableSchema::probe` to get a
/// `TableNotFound` error instead.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare(TABLE_INFO_SQL)?;
    let mut rows = stmt.query([table])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(Column::from_pragma_row(row, columns.len())?);
    }
    Ok(columns)
}

/// Quotes an identifier for use in SQL text, doubling embedded quotes.
///
/// Only names already validated against the catalog or a `TableSchema`
/// should be passed through here.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
