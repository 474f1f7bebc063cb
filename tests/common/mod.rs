//! Shared fixture for the integration tests: a temporary database
//! directory laid out the way the browser expects it.
#![allow(dead_code)]

use rusqlite::Connection;
use std::path::Path;
use tablebrowser::{Config, ConnectionManager};
use tempfile::TempDir;

pub const MONDIAL_SQL: &str = "
    CREATE TABLE country (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        population INTEGER
    );
    INSERT INTO country VALUES ('D', 'Germany', 83240525);
    INSERT INTO country VALUES ('F', 'France', 67750000);
    INSERT INTO country VALUES ('XX', 'Atlantis', NULL);
    CREATE TABLE river (name TEXT PRIMARY KEY, length REAL);
    INSERT INTO river VALUES ('Rhine', 1233.0);
";

pub const RPG_SQL: &str = "
    CREATE TABLE Player (name TEXT PRIMARY KEY, class TEXT, level INTEGER DEFAULT 1);
    INSERT INTO Player VALUES ('ouija', 'rogue', 12);
";

/// Creates `<dir>/<name>.db` from a batch of SQL
pub fn create_database(dir: &Path, name: &str, sql: &str) {
    let conn = Connection::open(dir.join(format!("{}.db", name))).unwrap();
    conn.execute_batch(sql).unwrap();
}

/// A directory with `mondial.db` and `rpg.db`
pub fn sample_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    create_database(dir.path(), "mondial", MONDIAL_SQL);
    create_database(dir.path(), "rpg", RPG_SQL);
    dir
}

pub fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.directory = dir.to_path_buf();
    config
}

pub fn manager_for(dir: &Path) -> ConnectionManager {
    ConnectionManager::new(&config_for(dir))
}
