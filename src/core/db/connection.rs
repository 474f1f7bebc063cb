/// Connection Management Module
///
/// Owns the one database the browser is looking at and every connection
/// made to it. There is no process-wide handle: callers hold a
/// `ConnectionManager` and lend it to table accessors by reference, so an
/// accessor cannot outlive a `switch` or `close`.

use crate::config::{Config, ConnectionPolicy, SqliteConfig, StorageConfig};
use crate::core::db::schema;
use crate::core::db::table::TableAccessor;
use crate::core::{BrowserError, Result};
use crate::views::ViewTeardown;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The database currently selected by the manager
#[derive(Debug)]
struct OpenDatabase {
    name: String,
    path: PathBuf,
    /// Kept only under `ConnectionPolicy::LongLived`
    held: Option<Connection>,
}

/// Result of a `switch` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The selection was the "no selection" sentinel; nothing changed
    NothingSelected,
    /// The previous database (if any) was closed and the new one opened
    Switched {
        previous: Option<String>,
        current: String,
    },
}

/// Connection manager for the table browser
#[derive(Debug)]
pub struct ConnectionManager {
    storage: StorageConfig,
    sqlite: SqliteConfig,
    no_selection: String,
    not_found: String,
    current: Option<OpenDatabase>,
}

impl ConnectionManager {
    /// Creates a closed manager using the given configuration
    pub fn new(config: &Config) -> Self {
        ConnectionManager {
            storage: config.storage.clone(),
            sqlite: config.sqlite.clone(),
            no_selection: config.browser.no_selection.clone(),
            not_found: config.browser.not_found.clone(),
            current: None,
        }
    }

    /// Opens the named database, closing any database that was open before.
    ///
    /// The file must already exist under the storage directory. Write-ahead
    /// logging (or the configured journal mode) is applied immediately and
    /// read back.
    ///
    /// # Errors
    ///
    /// Returns `BrowserError::Connection` if the file is missing, cannot be
    /// opened, or a pragma fails.
    pub fn open(&mut self, name: &str) -> Result<()> {
        self.close()?;

        let path = self.storage.database_path(name);
        if !path.is_file() {
            return Err(BrowserError::Connection(format!(
                "Database file not found: {}",
                path.display()
            )));
        }

        let conn = self.connect(&path)?;
        let journal_mode: String = conn
            .pragma_update_and_check(None, "journal_mode", &self.sqlite.journal_mode, |row| {
                row.get(0)
            })
            .map_err(|e| {
                BrowserError::Connection(format!("Failed to set journal_mode: {}", e))
            })?;
        debug!("Journal mode for '{}' is {}", name, journal_mode);

        let held = match self.sqlite.connection_policy {
            ConnectionPolicy::LongLived => Some(conn),
            ConnectionPolicy::PerCall => {
                release(conn)?;
                None
            }
        };

        info!("Opened database '{}' at {}", name, path.display());
        self.current = Some(OpenDatabase {
            name: name.to_string(),
            path,
            held,
        });
        Ok(())
    }

    /// Switches to another database.
    ///
    /// The view collaborator is told to tear down every table view before
    /// the current connection is closed. Selecting the "no selection"
    /// sentinel is a no-op. If the new database cannot be opened the
    /// manager is left closed.
    pub fn switch(&mut self, name: &str, views: &mut dyn ViewTeardown) -> Result<SwitchOutcome> {
        if name == self.no_selection {
            warn!("No database selected");
            return Ok(SwitchOutcome::NothingSelected);
        }

        let previous = self.current_name().map(str::to_string);
        info!(
            "Changing database from {} to {}",
            previous.as_deref().unwrap_or("<none>"),
            name
        );
        views.teardown_all(previous.as_deref());
        self.close()?;
        self.open(name)?;

        Ok(SwitchOutcome::Switched {
            previous,
            current: name.to_string(),
        })
    }

    /// Releases the current database and any connection held for it.
    ///
    /// Calling this on a closed manager succeeds and does nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(db) = self.current.take() {
            if let Some(conn) = db.held {
                release(conn)?;
            }
            info!("Closed database '{}'", db.name);
        }
        Ok(())
    }

    /// Lists the user tables of the current database, ordered by name
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.with_connection(schema::list_tables)
    }

    /// Returns an accessor for one table of the current database
    pub fn table(&self, name: &str) -> TableAccessor<'_> {
        TableAccessor::new(self, name)
    }

    /// Lists the database names available in the storage directory
    pub fn list_database_names(&self) -> Result<Vec<String>> {
        crate::catalog::list_database_names(&self.storage.directory, &self.storage.extension)
    }

    /// Runs one unit of work against the current database.
    ///
    /// Under the per-call policy a fresh connection is opened for `f` and
    /// closed afterwards on every exit path; a close failure is reported
    /// only when `f` itself succeeded.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let db = self
            .current
            .as_ref()
            .ok_or_else(|| BrowserError::Connection("No database is open".to_string()))?;

        if let Some(conn) = &db.held {
            return f(conn);
        }

        let conn = self.connect(&db.path)?;
        let result = f(&conn);
        match result {
            Ok(value) => {
                release(conn)?;
                Ok(value)
            }
            Err(e) => {
                drop(conn);
                Err(e)
            }
        }
    }

    /// Checks if a database is currently selected
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Name of the current database (if any)
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|db| db.name.as_str())
    }

    /// File path of the current database (if any)
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|db| db.path.as_path())
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.sqlite.connection_policy
    }

    /// Text returned by legacy point lookups that miss
    pub fn not_found_sentinel(&self) -> &str {
        &self.not_found
    }

    /// Opens a connection to an existing file and applies per-connection settings
    fn connect(&self, path: &Path) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            BrowserError::Connection(format!("Cannot open {}: {}", path.display(), e))
        })?;

        conn.busy_timeout(self.sqlite.busy_timeout())
            .map_err(|e| BrowserError::Connection(format!("Failed to set busy timeout: {}", e)))?;

        if let Some(mode) = &self.sqlite.synchronous {
            conn.pragma_update(None, "synchronous", mode)
                .map_err(|e| BrowserError::Connection(format!("Failed to set synchronous: {}", e)))?;
        }

        debug!("Connected to {}", path.display());
        Ok(conn)
    }
}

/// Closes a connection, surfacing the error SQLite reports on close
fn release(conn: Connection) -> Result<()> {
    conn.close()
        .map_err(|(_, e)| BrowserError::Connection(format!("Failed to close connection: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DatabaseFixture;
    use crate::views::{NoViews, TableViews};

    #[test]
    fn test_open_applies_wal() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();

        assert!(!manager.is_open());
        manager.open("mondial").unwrap();
        assert!(manager.is_open());
        assert_eq!(manager.current_name(), Some("mondial"));

        let mode: String = manager
            .with_connection(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_synchronous_applies_to_every_connection() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut config = fixture.config();
        config.sqlite.synchronous = Some("NORMAL".to_string());
        let mut manager = ConnectionManager::new(&config);
        manager.open("mondial").unwrap();

        // Per-call connections are fresh, so the pragma must be set on each
        for _ in 0..2 {
            let level: i64 = manager
                .with_connection(|conn| Ok(conn.query_row("PRAGMA synchronous", [], |r| r.get(0))?))
                .unwrap();
            assert_eq!(level, 1);
        }
    }

    #[test]
    fn test_open_missing_database() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();

        match manager.open("atlantis") {
            Err(BrowserError::Connection(msg)) => assert!(msg.contains("atlantis.db")),
            other => panic!("Expected Connection error, got {:?}", other),
        }
        assert!(!manager.is_open());
        // Opening must not have created the file
        assert!(!fixture.dir().join("atlantis.db").exists());
    }

    #[test]
    fn test_operations_require_open_database() {
        let fixture = DatabaseFixture::new().unwrap();
        let manager = fixture.manager();

        match manager.list_tables() {
            Err(BrowserError::Connection(msg)) => assert!(msg.contains("No database is open")),
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();
        manager.open("mondial").unwrap();

        manager.close().unwrap();
        assert!(!manager.is_open());
        manager.close().unwrap();
        assert!(!manager.is_open());
    }

    #[test]
    fn test_list_tables() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();

        manager.open("mondial").unwrap();
        assert_eq!(manager.list_tables().unwrap(), vec!["city", "country"]);

        manager.open("empty").unwrap();
        assert!(manager.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_switch_replaces_tables_and_tears_down_views() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();
        let mut views = TableViews::default();

        manager.open("mondial").unwrap();
        views.open(&manager, "country").unwrap();
        assert_eq!(views.names(), ["country"]);

        let outcome = manager.switch("rpg", &mut views).unwrap();
        assert_eq!(
            outcome,
            SwitchOutcome::Switched {
                previous: Some("mondial".to_string()),
                current: "rpg".to_string(),
            }
        );
        assert!(views.names().is_empty());

        let tables = manager.list_tables().unwrap();
        assert_eq!(tables, vec!["Player"]);
    }

    #[test]
    fn test_switch_no_selection_is_noop() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();
        manager.open("mondial").unwrap();

        let outcome = manager.switch("Select database", &mut NoViews).unwrap();
        assert_eq!(outcome, SwitchOutcome::NothingSelected);
        assert_eq!(manager.current_name(), Some("mondial"));
    }

    #[test]
    fn test_switch_to_missing_database_leaves_manager_closed() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();
        manager.open("mondial").unwrap();

        assert!(manager.switch("atlantis", &mut NoViews).is_err());
        assert!(!manager.is_open());
    }

    #[test]
    fn test_long_lived_policy_reuses_connection() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager_with_policy(ConnectionPolicy::LongLived);
        manager.open("mondial").unwrap();

        // A temp table only survives if both calls share one connection
        manager
            .with_connection(|conn| Ok(conn.execute_batch("CREATE TEMP TABLE scratch (x);")?))
            .unwrap();
        let count: i64 = manager
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM temp.sqlite_master WHERE name = 'scratch'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 1);
        manager.close().unwrap();
    }

    #[test]
    fn test_per_call_policy_uses_fresh_connections() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();
        manager.open("mondial").unwrap();

        manager
            .with_connection(|conn| Ok(conn.execute_batch("CREATE TEMP TABLE scratch (x);")?))
            .unwrap();
        let count: i64 = manager
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM temp.sqlite_master WHERE name = 'scratch'",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_failed_unit_of_work_still_releases() {
        let fixture = DatabaseFixture::new().unwrap();
        let mut manager = fixture.manager();
        manager.open("mondial").unwrap();

        let result: Result<()> = manager.with_connection(|conn| {
            conn.execute_batch("SELECT * FROM nowhere;")?;
            Ok(())
        });
        assert!(result.is_err());

        // The next unit of work is unaffected
        assert_eq!(manager.list_tables().unwrap().len(), 2);
    }

    #[test]
    fn test_list_database_names() {
        let fixture = DatabaseFixture::new().unwrap();
        let manager = fixture.manager();
        assert_eq!(
            manager.list_database_names().unwrap(),
            vec!["empty", "mondial", "rpg"]
        );
    }
}
