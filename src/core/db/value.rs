/// Cell Value Module
///
/// Rows are carried as typed values and only turned into text when they
/// cross into the UI layer. NULL and the empty string stay distinct here;
/// only the display form collapses them.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// A single cell of a table row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Returns the text shown for this value in a table view.
    ///
    /// NULL renders as the empty string and blobs as a size marker.
    pub fn to_display(&self) -> String {
        self.to_string()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(i) => write!(f, "{}", i),
            // Whole reals keep a ".0" so they never read as integers
            CellValue::Real(r) if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e15 => {
                write!(f, "{:.1}", r)
            }
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(t) => f.write_str(t),
            CellValue::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(r) => CellValue::Real(r),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            CellValue::Null => ValueRef::Null,
            CellValue::Integer(i) => ValueRef::Integer(*i),
            CellValue::Real(r) => ValueRef::Real(*r),
            CellValue::Text(t) => ValueRef::Text(t.as_bytes()),
            CellValue::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(value: Vec<u8>) -> Self {
        CellValue::Blob(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_display_text() {
        assert_eq!(CellValue::Null.to_display(), "");
        assert_eq!(CellValue::Integer(42).to_display(), "42");
        assert_eq!(CellValue::Real(123.45).to_display(), "123.45");
        assert_eq!(CellValue::Real(1233.0).to_display(), "1233.0");
        assert_eq!(CellValue::Real(-0.0).to_display(), "-0.0");
        assert_eq!(CellValue::from("Alice").to_display(), "Alice");
        assert_eq!(CellValue::Blob(b"Hello".to_vec()).to_display(), "<BLOB: 5 bytes>");
    }

    #[test]
    fn test_null_and_empty_text_stay_distinct() {
        let empty = CellValue::from("");
        assert_ne!(empty, CellValue::Null);
        assert!(!empty.is_null());
        assert_eq!(empty.to_display(), CellValue::Null.to_display());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(CellValue::from(None::<i64>), CellValue::Null);
        assert_eq!(CellValue::from(Some(7_i64)), CellValue::Integer(7));
    }

    #[test]
    fn test_binds_as_parameter() {
        let conn = Connection::open_in_memory().unwrap();
        let values = [
            CellValue::Integer(1),
            CellValue::Real(2.5),
            CellValue::from("three"),
            CellValue::Null,
        ];
        let mut stmt = conn.prepare("SELECT ?1, ?2, ?3, ?4").unwrap();
        let row: Vec<CellValue> = stmt
            .query_row(rusqlite::params_from_iter(values.iter()), |row| {
                (0..4).map(|i| row.get_ref(i).map(CellValue::from)).collect()
            })
            .unwrap();
        assert_eq!(row, values.to_vec());
    }
}
