//! Error taxonomy for the persistence layer. Every repository function
//! returns [`ShelfResult`] so callers can tell "no rows" apart from "the query
//! failed", and each variant carries the intent of the operation that hit it.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

pub type ShelfResult<T> = Result<T, ShelfError>;

#[derive(Debug, Error)]
pub enum ShelfError {
    /// The SQLite file could not be opened or configured.
    #[error("could not open cookbook store at {}: {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The directory that should hold the database file could not be created.
    #[error("could not create data directory {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A uniqueness, foreign-key or not-null rule rejected the write.
    #[error("{action}: {detail}")]
    Constraint { action: &'static str, detail: String },

    /// The referenced cookbook does not exist.
    #[error("{action}: no cookbook found with id {cookbook_id}")]
    NotFound {
        action: &'static str,
        cookbook_id: i64,
    },

    #[error("{action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl ShelfError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShelfError::NotFound { .. })
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, ShelfError::Constraint { .. })
    }

    /// Classify a raw SQLite error. Constraint violations get their own
    /// variant so the UI can phrase them as input problems.
    pub(crate) fn from_sqlite(action: &'static str, err: rusqlite::Error) -> Self {
        if matches!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation)) {
            ShelfError::Constraint {
                action,
                detail: err.to_string(),
            }
        } else {
            ShelfError::Storage { action, source: err }
        }
    }
}

/// `.context(...)` for rusqlite results that lands in [`ShelfError`] instead
/// of `anyhow`.
pub(crate) trait StorageContext<T> {
    fn storage_context(self, action: &'static str) -> ShelfResult<T>;
}

impl<T> StorageContext<T> for Result<T, rusqlite::Error> {
    fn storage_context(self, action: &'static str) -> ShelfResult<T> {
        self.map_err(|err| ShelfError::from_sqlite(action, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rusqlite::Connection;

    #[test]
    fn constraint_violations_are_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE NOT NULL)")
            .unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('x')", []).unwrap();

        let err = conn
            .execute("INSERT INTO t (name) VALUES ('x')", [])
            .storage_context("failed to insert row")
            .unwrap_err();

        assert!(err.is_constraint());
        assert!(err.to_string().starts_with("failed to insert row: "));
    }

    #[test]
    fn other_failures_are_storage_errors() {
        let conn = Connection::open_in_memory().unwrap();

        let err = conn
            .execute("INSERT INTO missing_table (x) VALUES (1)", [])
            .storage_context("failed to insert row")
            .unwrap_err();

        assert!(matches!(err, ShelfError::Storage { .. }));
        assert!(err.to_string().contains("missing_table"));
    }

    #[test]
    fn not_found_names_the_cookbook() {
        let err = ShelfError::NotFound {
            action: "failed to add tags",
            cookbook_id: 9999,
        };
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "failed to add tags: no cookbook found with id 9999"
        );
    }
}
