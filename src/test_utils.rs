/// # Test Utilities Module
///
/// Throwaway database directories for unit tests. Each fixture owns a
/// temporary `Databases/`-style directory holding three databases:
/// - `mondial.db`: `country` and `city`, including a NULL population
/// - `rpg.db`: a single `Player` table
/// - `empty.db`: no user tables

use crate::config::{Config, ConnectionPolicy};
use crate::core::db::ConnectionManager;
use crate::core::Result;
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

const MONDIAL_SQL: &str = "
    CREATE TABLE country (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        population INTEGER
    );
    INSERT INTO country VALUES ('D', 'Germany', 83240525);
    INSERT INTO country VALUES ('F', 'France', 67750000);
    INSERT INTO country VALUES ('XX', 'Atlantis', NULL);

    CREATE TABLE city (
        name TEXT,
        country TEXT REFERENCES country(code),
        population INTEGER,
        elevation REAL,
        PRIMARY KEY (name, country)
    );
    INSERT INTO city VALUES ('Berlin', 'D', 3644826, 34.0);
    INSERT INTO city VALUES ('Paris', 'F', 2161000, 35.5);
";

const RPG_SQL: &str = "
    CREATE TABLE Player (
        name TEXT PRIMARY KEY,
        class TEXT,
        level INTEGER DEFAULT 1
    );
    INSERT INTO Player VALUES ('ouija', 'rogue', 12);
";

/// Isolated database directory fixture
pub struct DatabaseFixture {
    dir: TempDir,
}

impl DatabaseFixture {
    /// Creates the directory and its three sample databases
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        create_database(&dir.path().join("mondial.db"), MONDIAL_SQL)?;
        create_database(&dir.path().join("rpg.db"), RPG_SQL)?;
        create_database(&dir.path().join("empty.db"), "")?;
        Ok(DatabaseFixture { dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Configuration pointing at the fixture directory
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.directory = self.dir.path().to_path_buf();
        config
    }

    /// A closed manager using the per-call connection policy
    pub fn manager(&self) -> ConnectionManager {
        ConnectionManager::new(&self.config())
    }

    pub fn manager_with_policy(&self, policy: ConnectionPolicy) -> ConnectionManager {
        let mut config = self.config();
        config.sqlite.connection_policy = policy;
        ConnectionManager::new(&config)
    }
}

fn create_database(path: &Path, sql: &str) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(sql)?;
    Ok(())
}
