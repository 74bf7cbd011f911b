use std::path::Path;

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::models::{NewStudent, Student, DATE_FORMAT};

use super::connection::{ensure_schema, open_connection};

const SELECT_COLUMNS: &str = "SELECT id, name, age, class, score, date_added FROM students";

/// Owner of the single SQLite handle. Every operation commits on its own;
/// there is no batching across calls.
pub struct StudentStore {
    conn: Option<Connection>,
}

impl StudentStore {
    /// Open the database file at `path`, creating it and running migrations
    /// as needed.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = open_connection(path)?;
        info!(path = %path.display(), "opened student database");
        Ok(Self { conn: Some(conn) })
    }

    /// A throwaway store, handy for tests and previews.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> Result<&Connection, StorageError> {
        self.conn.as_ref().ok_or(StorageError::Closed)
    }

    /// All students in insertion order, optionally narrowed to names that
    /// contain `filter`. An empty filter behaves like no filter. `%`, `_` and
    /// `\` in the filter match literally.
    pub fn fetch_all(&self, filter: Option<&str>) -> Result<Vec<Student>, StorageError> {
        let conn = self.conn()?;
        let students = match filter.filter(|text| !text.is_empty()) {
            Some(text) => {
                let pattern = format!("%{}%", escape_like(text));
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id"
                ))?;
                let rows = stmt
                    .query_map(params![pattern], student_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
                let rows = stmt
                    .query_map([], student_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        debug!(count = students.len(), ?filter, "fetched students");
        Ok(students)
    }

    /// A single student by id, or `None` when it does not exist.
    pub fn fetch_one(&self, id: i64) -> Result<Option<Student>, StorageError> {
        let student = self
            .conn()?
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                student_from_row,
            )
            .optional()?;
        Ok(student)
    }

    /// Persist a new student stamped with the current local time and return
    /// the id SQLite assigned.
    pub fn insert(&self, student: &NewStudent) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        let now = Local::now().format(DATE_FORMAT).to_string();
        conn.execute(
            "INSERT INTO students (name, age, class, score, date_added)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                student.name,
                student.age,
                student.class_name,
                student.score,
                now
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, name = %student.name, "inserted student");
        Ok(id)
    }

    /// Overwrite the editable fields of `id`. `date_added` is left alone.
    /// Returns `false` when no such row exists; that case is not an error.
    pub fn update(&self, id: i64, student: &NewStudent) -> Result<bool, StorageError> {
        let updated = self.conn()?.execute(
            "UPDATE students SET name = ?1, age = ?2, class = ?3, score = ?4 WHERE id = ?5",
            params![
                student.name,
                student.age,
                student.class_name,
                student.score,
                id
            ],
        )?;

        if updated == 0 {
            warn!(id, "update matched no student");
        } else {
            info!(id, "updated student");
        }
        Ok(updated > 0)
    }

    /// Remove `id`. Returns `false` when it was already gone.
    pub fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM students WHERE id = ?1", params![id])?;

        if deleted == 0 {
            warn!(id, "delete matched no student");
        } else {
            info!(id, "deleted student");
        }
        Ok(deleted > 0)
    }

    /// Release the connection. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), StorageError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| StorageError::Sqlite(err))?;
            info!("closed student database");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        class_name: row.get(3)?,
        score: row.get(4)?,
        date_added: row.get(5)?,
    })
}

/// Escape LIKE wildcards so the filter is matched as plain text.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
