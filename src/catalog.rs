//! Discovery of the database files kept in the storage directory.

use crate::core::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Lists the databases available in `dir`: the file stems of every
/// `*.<extension>` file, sorted by name.
///
/// A missing directory yields an empty list rather than an error, so a
/// fresh installation simply shows no databases.
pub fn list_database_names(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Database directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lists_matching_files_sorted() {
        let dir = tempdir().unwrap();
        for file in ["mondial.db", "RPG.db", "notes.txt", "backup.db-wal"] {
            fs::write(dir.path().join(file), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.db")).unwrap();

        let names = list_database_names(dir.path(), "db").unwrap();
        assert_eq!(names, vec!["RPG", "mondial"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let names = list_database_names(&dir.path().join("Databases"), "db").unwrap();
        assert!(names.is_empty());
    }
}
