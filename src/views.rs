//! Headless bookkeeping for the table views a UI has open.
//!
//! The backend never draws anything. It only tracks which tables have a
//! view so that a database switch can tell the UI to destroy all of them.
use crate::config::BrowserConfig;
use crate::core::db::{ConnectionManager, TableData};
use crate::core::Result;
use tracing::{debug, info, warn};

/// Receives the "destroy every table view" signal sent by `ConnectionManager::switch`.
pub trait ViewTeardown {
    /// Called before the connection to `database` is closed.
    fn teardown_all(&mut self, database: Option<&str>);
}

/// A collaborator with no views, for callers that do not display tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoViews;

impl ViewTeardown for NoViews {
    fn teardown_all(&mut self, _database: Option<&str>) {}
}

/// What happened when a view was requested
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    /// The selection was the "no table" sentinel
    NothingSelected,
    /// The table was loaded and its view registered
    Opened(TableData),
}

/// Registry of open table views, in the order they were opened.
#[derive(Debug, Clone)]
pub struct TableViews {
    no_selection: String,
    open: Vec<String>,
}

impl Default for TableViews {
    fn default() -> Self {
        TableViews::new(&BrowserConfig::default())
    }
}

impl TableViews {
    pub fn new(config: &BrowserConfig) -> Self {
        TableViews {
            no_selection: config.no_table_selection.clone(),
            open: Vec::new(),
        }
    }

    /// Loads a table and registers a view for it.
    ///
    /// Requesting a table that already has a view reloads it without
    /// registering a second view.
    ///
    /// # Errors
    ///
    /// Propagates `TableNotFound` and every other load failure; nothing is
    /// registered in that case.
    pub fn open(&mut self, manager: &ConnectionManager, table: &str) -> Result<ViewOutcome> {
        if table == self.no_selection {
            warn!("No table selected");
            return Ok(ViewOutcome::NothingSelected);
        }

        let data = manager.table(table).load()?;
        if !self.is_open(table) {
            self.open.push(table.to_string());
        }
        debug!("Opened view for '{}' with {} rows", table, data.row_count());
        Ok(ViewOutcome::Opened(data))
    }

    /// Removes the view for `table`. Returns false when no such view exists.
    pub fn destroy(&mut self, table: &str) -> bool {
        match self.open.iter().position(|name| name == table) {
            Some(index) => {
                self.open.remove(index);
                true
            }
            None => {
                warn!("No valid table view found for '{}'", table);
                false
            }
        }
    }

    pub fn is_open(&self, table: &str) -> bool {
        self.open.iter().any(|name| name == table)
    }

    pub fn names(&self) -> &[String] {
        &self.open
    }
}

impl ViewTeardown for TableViews {
    fn teardown_all(&mut self, database: Option<&str>) {
        info!(
            "Tearing down {} table views of {}",
            self.open.len(),
            database.unwrap_or("<none>")
        );
        self.open.clear();
    }
}
