/// Table Access Module
///
/// `TableAccessor` is the per-table half of the browser: it loads a table's
/// columns and rows and runs keyed mutations. It borrows the connection
/// from `ConnectionManager` for each call and holds nothing but the table
/// name between calls.
///
/// Caller-supplied identifiers never reach SQL text unchecked. The table
/// name must be in the catalog and every column name must appear in the
/// table's probed schema; values are always bound as parameters.

use crate::core::db::connection::ConnectionManager;
use crate::core::db::schema::{quote_identifier, table_exists, Column, TableSchema};
use crate::core::db::value::CellValue;
use crate::core::{BrowserError, Result};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Columns and rows of one table, loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub table: String,
    pub columns: Vec<Column>,
    /// Every row has exactly `columns.len()` cells
    pub rows: Vec<Vec<CellValue>>,
}

impl TableData {
    /// Header labels in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Rows as display text, NULL rendered as ""
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(CellValue::to_display).collect())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Comparison operators allowed in a delete criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    IsNull,
    IsNotNull,
}

impl Comparison {
    fn operator(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::NotEq => "<>",
            Comparison::Lt => "<",
            Comparison::LtEq => "<=",
            Comparison::Gt => ">",
            Comparison::GtEq => ">=",
            Comparison::Like => "LIKE",
            Comparison::IsNull => "IS NULL",
            Comparison::IsNotNull => "IS NOT NULL",
        }
    }

    fn takes_value(self) -> bool {
        !matches!(self, Comparison::IsNull | Comparison::IsNotNull)
    }
}

/// One `column <op> value` term of a criterion
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub comparison: Comparison,
    pub value: CellValue,
}

/// A row predicate: every condition must hold (AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criterion {
    conditions: Vec<Condition>,
}

impl Criterion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `column = value`
    pub fn equals(column: &str, value: impl Into<CellValue>) -> Self {
        Self::new().and(column, Comparison::Eq, value)
    }

    pub fn and(mut self, column: &str, comparison: Comparison, value: impl Into<CellValue>) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            comparison,
            value: value.into(),
        });
        self
    }

    pub fn and_null(self, column: &str) -> Self {
        self.and(column, Comparison::IsNull, CellValue::Null)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders the WHERE clause body and its bound values.
    fn to_sql(&self, schema: &TableSchema) -> Result<(String, Vec<CellValue>)> {
        if self.conditions.is_empty() {
            return Err(BrowserError::Query(format!(
                "Refusing to delete from '{}' without a criterion",
                schema.name
            )));
        }

        let mut terms = Vec::with_capacity(self.conditions.len());
        let mut values = Vec::new();
        for condition in &self.conditions {
            let column = schema.resolve(&condition.column)?;
            let comparison = condition.comparison;
            if comparison.takes_value() {
                terms.push(format!("{} {} ?", quote_identifier(&column.name), comparison.operator()));
                values.push(condition.value.clone());
            } else {
                terms.push(format!("{} {}", quote_identifier(&column.name), comparison.operator()));
            }
        }
        Ok((terms.join(" AND "), values))
    }
}

/// Access to one table of the database currently open in a `ConnectionManager`.
#[derive(Debug)]
pub struct TableAccessor<'a> {
    manager: &'a ConnectionManager,
    table: String,
}

impl<'a> TableAccessor<'a> {
    pub fn new(manager: &'a ConnectionManager, table: &str) -> Self {
        TableAccessor {
            manager,
            table: table.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    /// Checks whether the table is present in the catalog
    pub fn exists(&self) -> Result<bool> {
        self.manager
            .with_connection(|conn| table_exists(conn, &self.table))
    }

    /// Probes the table's columns in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `BrowserError::TableNotFound` if the table does not exist.
    pub fn schema(&self) -> Result<TableSchema> {
        self.manager
            .with_connection(|conn| TableSchema::probe(conn, &self.table))
    }

    pub fn columns(&self) -> Result<Vec<Column>> {
        self.schema().map(|schema| schema.columns)
    }

    /// Loads the table's columns and all of its rows in one unit of work.
    ///
    /// # Errors
    ///
    /// - `BrowserError::TableNotFound` if the table does not exist
    /// - `BrowserError::SchemaMismatch` if the row scan's arity differs from
    ///   the probed column count
    pub fn load(&self) -> Result<TableData> {
        self.manager.with_connection(|conn| {
            let schema = TableSchema::probe(conn, &self.table)?;
            let mut rows = Vec::new();
            scan(conn, &schema, |row| {
                rows.push(row);
                ControlFlow::Continue(())
            })?;
            debug!("Loaded {} rows from '{}'", rows.len(), self.table);
            Ok(TableData {
                table: schema.name,
                columns: schema.columns,
                rows,
            })
        })
    }

    /// Streams the table's rows to `visit` one at a time.
    ///
    /// `visit` may return `ControlFlow::Break` to stop early. Returns the
    /// probed columns and the number of rows visited.
    pub fn for_each_row<F>(&self, visit: F) -> Result<(Vec<Column>, usize)>
    where
        F: FnMut(Vec<CellValue>) -> ControlFlow<()>,
    {
        self.manager.with_connection(|conn| {
            let schema = TableSchema::probe(conn, &self.table)?;
            let visited = scan(conn, &schema, visit)?;
            Ok((schema.columns, visited))
        })
    }

    /// Inserts a row, replacing any row that collides on a unique key.
    ///
    /// The key pair is written first, followed by `values`. Returns the
    /// number of rows written.
    pub fn upsert(
        &self,
        key_column: &str,
        key: impl Into<CellValue>,
        values: &[(&str, CellValue)],
    ) -> Result<usize> {
        let key = key.into();
        self.manager.with_connection(|conn| {
            let schema = TableSchema::probe(conn, &self.table)?;

            let mut names = Vec::with_capacity(values.len() + 1);
            names.push(schema.resolve(key_column)?.name.as_str());
            for (column, _) in values {
                let name = schema.resolve(column)?.name.as_str();
                if names.contains(&name) {
                    return Err(BrowserError::Query(format!(
                        "Column '{}' given more than once",
                        name
                    )));
                }
                names.push(name);
            }

            let sql = format!(
                "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
                quote_identifier(&schema.name),
                names.iter().map(|n| quote_identifier(n)).collect::<Vec<_>>().join(", "),
                vec!["?"; names.len()].join(", ")
            );
            let params = std::iter::once(&key).chain(values.iter().map(|(_, v)| v));
            execute(conn, &sql, params)
        })
    }

    /// Sets one column of every row where `key_column = key`.
    ///
    /// Returns the number of rows changed; no match is not an error.
    pub fn set_value(
        &self,
        key_column: &str,
        key: impl Into<CellValue>,
        column: &str,
        value: impl Into<CellValue>,
    ) -> Result<usize> {
        let key = key.into();
        let value = value.into();
        self.manager.with_connection(|conn| {
            let schema = TableSchema::probe(conn, &self.table)?;
            let sql = format!(
                "UPDATE OR REPLACE {} SET {} = ? WHERE {} = ?",
                quote_identifier(&schema.name),
                quote_identifier(&schema.resolve(column)?.name),
                quote_identifier(&schema.resolve(key_column)?.name)
            );
            let changed = execute(conn, &sql, [&value, &key])?;
            if changed == 0 {
                debug!("set_value on '{}' matched no rows", self.table);
            }
            Ok(changed)
        })
    }

    /// Deletes every row matching `criterion`.
    ///
    /// Returns the number of rows deleted; no match is not an error.
    ///
    /// # Errors
    ///
    /// An empty criterion or an unknown column is a `BrowserError::Query`.
    pub fn delete(&self, criterion: &Criterion) -> Result<usize> {
        self.manager.with_connection(|conn| {
            let schema = TableSchema::probe(conn, &self.table)?;
            let (predicate, values) = criterion.to_sql(&schema)?;
            let sql = format!("DELETE FROM {} WHERE {}", quote_identifier(&schema.name), predicate);
            execute(conn, &sql, values.iter())
        })
    }

    /// Reads `column` from the first row where `key_column = key`.
    ///
    /// Returns `None` when no row matches.
    pub fn query_value(
        &self,
        column: &str,
        key_column: &str,
        key: impl Into<CellValue>,
    ) -> Result<Option<CellValue>> {
        let key = key.into();
        self.manager.with_connection(|conn| {
            let schema = TableSchema::probe(conn, &self.table)?;
            let sql = format!(
                "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
                quote_identifier(&schema.resolve(column)?.name),
                quote_identifier(&schema.name),
                quote_identifier(&schema.resolve(key_column)?.name)
            );
            debug!("{}", sql);
            let mut stmt = prepare(conn, &sql)?;
            let found = stmt
                .query_row([&key], |row| row.get_ref(0).map(CellValue::from))
                .optional()
                .map_err(|e| BrowserError::Query(format!("Query execution failed: {}", e)))?;
            if found.is_none() {
                warn!("Nothing found in '{}' for {} = {}", self.table, key_column, key);
            }
            Ok(found)
        })
    }

    /// Display-text variant of `query_value`.
    pub fn query_string(
        &self,
        column: &str,
        key_column: &str,
        key: impl Into<CellValue>,
    ) -> Result<Option<String>> {
        Ok(self
            .query_value(column, key_column, key)?
            .map(|value| value.to_display()))
    }

    /// Like `query_string`, but a miss yields the configured "Not Found"
    /// text for callers that still expect the sentinel.
    pub fn query_string_or_not_found(
        &self,
        column: &str,
        key_column: &str,
        key: impl Into<CellValue>,
    ) -> Result<String> {
        Ok(self
            .query_string(column, key_column, key)?
            .unwrap_or_else(|| self.manager.not_found_sentinel().to_string()))
    }
}

/// Runs `SELECT *` over a probed table and hands each row to `visit`.
fn scan<F>(conn: &Connection, schema: &TableSchema, mut visit: F) -> Result<usize>
where
    F: FnMut(Vec<CellValue>) -> ControlFlow<()>,
{
    let sql = format!("SELECT * FROM {}", quote_identifier(&schema.name));
    debug!("{}", sql);
    let mut stmt = prepare(conn, &sql)?;
    let width = stmt.column_count();
    check_arity(schema, width)?;

    let mut rows = stmt
        .query([])
        .map_err(|e| BrowserError::Query(format!("Query execution failed: {}", e)))?;
    let mut visited = 0;
    while let Some(row) = rows.next()? {
        let cells = (0..width)
            .map(|i| row.get_ref(i).map(CellValue::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        visited += 1;
        if visit(cells).is_break() {
            break;
        }
    }
    Ok(visited)
}

fn check_arity(schema: &TableSchema, actual: usize) -> Result<()> {
    if schema.columns.len() != actual {
        return Err(BrowserError::SchemaMismatch {
            table: schema.name.clone(),
            expected: schema.columns.len(),
            actual,
        });
    }
    Ok(())
}

fn prepare<'c>(conn: &'c Connection, sql: &str) -> Result<rusqlite::Statement<'c>> {
    conn.prepare(sql)
        .map_err(|e| BrowserError::Query(format!("Failed to prepare statement: {}", e)))
}

fn execute<P>(conn: &Connection, sql: &str, params: P) -> Result<usize>
where
    P: IntoIterator,
    P::Item: rusqlite::ToSql,
{
    debug!("{}", sql);
    let mut stmt = prepare(conn, sql)?;
    let changed = stmt
        .execute(params_from_iter(params))
        .map_err(|e| BrowserError::Query(format!("Statement rejected: {}", e)))?;
    debug!("{} rows affected", changed);
    Ok(changed)
}
