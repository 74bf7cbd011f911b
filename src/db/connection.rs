use std::fs;
use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::error::StorageError;

/// Open (creating if needed) the database file and bring its schema up to
/// date. Parent directories are created on demand.
pub fn open_connection(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::DataDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `students` table when absent and run the additive migrations.
/// Safe to call on every startup.
pub fn ensure_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            class TEXT NOT NULL,
            score REAL NOT NULL,
            date_added TEXT
        )",
        [],
    )?;

    ensure_date_column(conn)
}

/// Older databases were created before `date_added` existed. Add the column
/// in place; existing rows keep their data and get NULL.
fn ensure_date_column(conn: &Connection) -> Result<(), StorageError> {
    let mut stmt = conn.prepare("PRAGMA table_info(students)")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if !columns.iter().any(|column| column == "date_added") {
        conn.execute("ALTER TABLE students ADD COLUMN date_added TEXT", [])?;
        info!("added date_added column to students table");
    }

    Ok(())
}
