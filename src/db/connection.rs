use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::error::{ShelfError, ShelfResult, StorageContext};

/// The four tables of the shelf. Column names and constraints match the
/// files written by earlier versions of the tracker so existing collections
/// open unchanged.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cookbooks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        year_published INTEGER,
        aesthetic_rating INTEGER,
        instagram_worthy BOOLEAN,
        cover_color TEXT
    );

    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS cookbook_tags (
        cookbook_id INTEGER,
        tag_id INTEGER,
        FOREIGN KEY (cookbook_id) REFERENCES cookbooks (id),
        FOREIGN KEY (tag_id) REFERENCES tags (id),
        PRIMARY KEY (cookbook_id, tag_id)
    );

    CREATE TABLE IF NOT EXISTS borrow_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cookbook_id INTEGER,
        friend_name TEXT NOT NULL,
        date_borrowed TEXT NOT NULL,
        date_returned TEXT,
        FOREIGN KEY (cookbook_id) REFERENCES cookbooks (id)
    );
";

/// Open (or create) the shelf database at `path`, enable foreign keys and
/// make sure every table exists. The parent directory is created on demand.
pub fn open_store(path: &Path) -> ShelfResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ShelfError::DataDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let conn = Connection::open(path).map_err(|source| ShelfError::Connection {
        path: path.to_path_buf(),
        source,
    })?;
    prepare_connection(&conn, path)?;
    tracing::info!(path = %path.display(), "connected to cookbook store");

    ensure_schema(&conn)?;
    Ok(conn)
}

/// Throwaway store used by tests and previews.
pub fn open_in_memory_store() -> ShelfResult<Connection> {
    let path = Path::new(":memory:");
    let conn = Connection::open_in_memory().map_err(|source| ShelfError::Connection {
        path: path.to_path_buf(),
        source,
    })?;
    prepare_connection(&conn, path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

fn prepare_connection(conn: &Connection, path: &Path) -> ShelfResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(|source| ShelfError::Connection {
            path: path.to_path_buf(),
            source,
        })
}

/// Create any missing tables in a single transaction. Running it against an
/// already initialised file is a no-op.
pub fn ensure_schema(conn: &Connection) -> ShelfResult<()> {
    let tx = conn
        .unchecked_transaction()
        .storage_context("failed to begin schema transaction")?;
    tx.execute_batch(SCHEMA)
        .storage_context("failed to create shelf tables")?;
    tx.commit()
        .storage_context("failed to commit shelf tables")?;

    tracing::debug!("shelf schema is up to date");
    Ok(())
}
