//! Presentation controller: validates user input, drives the record store and
//! keeps the displayed rows in step with it. Every mutation is followed by a
//! full re-fetch so the snapshot never drifts from what is stored.

mod form;

use std::path::Path;

use tracing::{error, info, warn};

use crate::db::StudentStore;
use crate::error::{AppError, StorageError};
use crate::export::{write_csv, write_report, ExportKind};
use crate::models::Student;

pub use form::{FormField, StudentForm, BAD_NUMBERS, MISSING_FIELDS};

pub const LOAD_FAILED: &str = "Failed to load students.";

pub struct Controller {
    store: StudentStore,
    form: StudentForm,
    search: String,
    /// Filter applied by the last search; reused by every refresh until
    /// "show all" clears it.
    filter: Option<String>,
    rows: Vec<Student>,
    selected: Option<i64>,
    status: String,
}

impl Controller {
    pub fn new(store: StudentStore) -> Self {
        Self {
            store,
            form: StudentForm::default(),
            search: String::new(),
            filter: None,
            rows: Vec::new(),
            selected: None,
            status: "Ready".to_string(),
        }
    }

    pub fn form(&self) -> &StudentForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut StudentForm {
        &mut self.form
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn search_text_mut(&mut self) -> &mut String {
        &mut self.search
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// The snapshot from the last refresh.
    pub fn rows(&self) -> &[Student] {
        &self.rows
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected?;
        self.rows.iter().position(|student| student.id == id)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
    }

    /// Replace the snapshot with a fresh fetch honoring the active filter.
    /// The selection survives only if its row is still present.
    pub fn refresh(&mut self) -> Result<(), AppError> {
        self.set_status("Loading...");
        let rows = match self.store.fetch_all(self.filter.as_deref()) {
            Ok(rows) => rows,
            Err(err) => {
                self.set_status(LOAD_FAILED);
                return Err(self.storage_failure(err));
            }
        };
        self.rows = rows;

        if self.selected_index().is_none() {
            self.selected = None;
        }

        let status = match average_score(&self.rows) {
            Some(average) => format!(
                "Loaded {} students (average score {average:.2}).",
                self.rows.len()
            ),
            None => "Loaded 0 students.".to_string(),
        };
        self.set_status(status);
        Ok(())
    }

    /// Validate the form and insert a new student.
    pub fn add(&mut self) -> Result<i64, AppError> {
        let student = self.form.parse_inputs().inspect_err(log_rejection)?;
        let id = self
            .store
            .insert(&student)
            .map_err(|err| self.storage_failure(err))?;

        self.form.clear();
        self.refresh_after(format!("Added student '{}'", student.name))?;
        Ok(id)
    }

    /// Validate the form and overwrite the selected student with it.
    pub fn update_selected(&mut self) -> Result<i64, AppError> {
        let id = self
            .selected
            .ok_or_else(|| AppError::Selection("Select a student to update.".to_string()))
            .inspect_err(log_rejection)?;
        let student = self.form.parse_inputs().inspect_err(log_rejection)?;

        let touched = self
            .store
            .update(id, &student)
            .map_err(|err| self.storage_failure(err))?;

        self.form.clear();
        let done = if touched {
            format!("Updated student ID {id}")
        } else {
            missing_status(id)
        };
        self.refresh_after(done)?;
        Ok(id)
    }

    /// The currently selected student, or a selection error naming `action`.
    pub fn require_selection(&self, action: &str) -> Result<&Student, AppError> {
        self.selected_index()
            .map(|index| &self.rows[index])
            .ok_or_else(|| AppError::Selection(format!("Select a student to {action}.")))
    }

    /// Delete the selected student. Confirmation is the caller's job.
    pub fn delete_selected(&mut self) -> Result<i64, AppError> {
        let id = self
            .selected
            .ok_or_else(|| AppError::Selection("Select a student to delete.".to_string()))
            .inspect_err(log_rejection)?;

        let touched = self
            .store
            .delete(id)
            .map_err(|err| self.storage_failure(err))?;

        let done = if touched {
            format!("Deleted student ID {id}")
        } else {
            missing_status(id)
        };
        self.refresh_after(done)?;
        Ok(id)
    }

    /// Filter the table by the trimmed search text. Blank text shows all rows.
    pub fn search(&mut self) -> Result<(), AppError> {
        let keyword = self.search.trim().to_string();
        self.filter = (!keyword.is_empty()).then(|| keyword.clone());
        self.refresh()?;
        self.set_status(format!("Search: '{keyword}'"));
        Ok(())
    }

    /// Drop the active filter and reload everything.
    pub fn show_all(&mut self) -> Result<(), AppError> {
        self.filter = None;
        self.refresh()
    }

    /// Mark `id` as the selected row, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<i64>) {
        self.selected = id;
    }

    /// Move the selection by `offset` rows within the snapshot, clamping at
    /// both ends. With nothing selected the first row is picked.
    pub fn select_offset(&mut self, offset: isize) {
        if self.rows.is_empty() {
            self.selected = None;
            return;
        }
        let last = self.rows.len() as isize - 1;
        let index = match self.selected_index() {
            Some(current) => (current as isize + offset).clamp(0, last),
            None => 0,
        };
        self.selected = Some(self.rows[index as usize].id);
    }

    pub fn select_first(&mut self) {
        self.selected = self.rows.first().map(|student| student.id);
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows.last().map(|student| student.id);
    }

    /// Read `id` from the store, copy its editable fields into the form and
    /// select it.
    pub fn load_for_edit(&mut self, id: i64) -> Result<(), AppError> {
        let student = self
            .store
            .fetch_one(id)
            .map_err(|err| self.storage_failure(err))?
            .ok_or_else(|| AppError::Selection(format!("Student ID {id} no longer exists.")))?;

        self.form = StudentForm::from_student(&student);
        self.selected = Some(id);
        self.set_status(format!("Selected student ID {id} for editing"));
        Ok(())
    }

    pub fn clear_inputs(&mut self) {
        self.form.clear();
    }

    /// Write every student (ignoring any search filter) to `path` in the
    /// requested format. Returns the number of exported rows.
    pub fn export(&mut self, kind: ExportKind, path: &Path) -> Result<usize, AppError> {
        let students = self
            .store
            .fetch_all(None)
            .map_err(|err| self.storage_failure(err))?;

        let written = match kind {
            ExportKind::Csv => write_csv(path, &students),
            ExportKind::Report => write_report(path, &students),
        };
        if let Err(err) = written {
            error!(path = %path.display(), error = %err, "export failed");
            return Err(err.into());
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(path = %path.display(), rows = students.len(), format = kind.label(), "exported students");
        self.set_status(format!("Exported {}: {file_name}", kind.label()));
        Ok(students.len())
    }

    /// Close the store. Further commands fail with a storage error.
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        self.store.close()?;
        Ok(())
    }

    /// Reload after a committed mutation. The change stands even when the
    /// reload fails; the status then flags the table as stale.
    fn refresh_after(&mut self, done: String) -> Result<(), AppError> {
        let reloaded = self.refresh();
        match &reloaded {
            Ok(()) => self.set_status(done),
            Err(_) => self.set_status(format!("{done} (table not refreshed)")),
        }
        reloaded
    }

    fn storage_failure(&self, err: StorageError) -> AppError {
        error!(error = %err, "storage operation failed");
        AppError::Storage(err)
    }
}

fn average_score(rows: &[Student]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(|student| student.score).sum::<f64>() / rows.len() as f64)
}

fn missing_status(id: i64) -> String {
    format!("No student with ID {id}; nothing changed.")
}

fn log_rejection(err: &AppError) {
    warn!(reason = %err, "command rejected");
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn controller() -> Controller {
        let mut controller = Controller::new(StudentStore::open_in_memory().unwrap());
        controller.refresh().unwrap();
        controller
    }

    fn fill(controller: &mut Controller, name: &str, age: &str, class_name: &str, score: &str) {
        *controller.form_mut() = StudentForm {
            name: name.to_string(),
            age: age.to_string(),
            class_name: class_name.to_string(),
            score: score.to_string(),
        };
    }

    fn add(controller: &mut Controller, name: &str, age: &str, class_name: &str, score: &str) -> i64 {
        fill(controller, name, age, class_name, score);
        controller.add().unwrap()
    }

    #[test]
    fn starts_ready_and_reports_empty_load() {
        let fresh = Controller::new(StudentStore::open_in_memory().unwrap());
        assert_eq!(fresh.status(), "Ready");

        assert_eq!(controller().status(), "Loaded 0 students.");
    }

    #[test]
    fn add_refreshes_rows_and_clears_form() {
        let mut controller = controller();
        let id = add(&mut controller, "Ada", "20", "CS1", "95.5");

        assert_eq!(controller.rows().len(), 1);
        assert_eq!(controller.rows()[0].id, id);
        assert_eq!(controller.form(), &StudentForm::default());
        assert_eq!(controller.status(), "Added student 'Ada'");
    }

    #[test]
    fn invalid_input_never_reaches_the_store() {
        let mut controller = controller();
        fill(&mut controller, "Ada", "-3", "CS1", "95.5");

        let err = controller.add().unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == BAD_NUMBERS));
        controller.refresh().unwrap();
        assert!(controller.rows().is_empty());
        assert_eq!(controller.form().age, "-3");
    }

    #[test]
    fn update_and_delete_require_a_selection() {
        let mut controller = controller();
        add(&mut controller, "Ada", "20", "CS1", "95.5");
        fill(&mut controller, "Ada L", "21", "CS1", "97");

        assert!(matches!(controller.update_selected(), Err(AppError::Selection(_))));
        assert!(matches!(controller.delete_selected(), Err(AppError::Selection(_))));
        assert!(controller.require_selection("delete").is_err());
        assert_eq!(controller.rows()[0].name, "Ada");
    }

    #[test]
    fn load_for_edit_then_update() {
        let mut controller = controller();
        let ada = add(&mut controller, "Ada", "20", "CS1", "95.5");
        let ben = add(&mut controller, "Ben", "19", "CS2", "88");

        controller.load_for_edit(ada).unwrap();
        assert_eq!(controller.selected(), Some(ada));
        assert_eq!(controller.form().name, "Ada");
        assert_eq!(controller.form().score, "95.5");
        assert_eq!(controller.status(), format!("Selected student ID {ada} for editing"));

        controller.form_mut().name = "Ada L".to_string();
        controller.update_selected().unwrap();

        let rows = controller.rows();
        assert_eq!(rows.iter().find(|s| s.id == ada).unwrap().name, "Ada L");
        assert_eq!(rows.iter().find(|s| s.id == ben).unwrap().name, "Ben");
        assert_eq!(controller.selected(), Some(ada));
        assert_eq!(controller.status(), format!("Updated student ID {ada}"));
    }

    #[test]
    fn load_for_edit_of_missing_row_is_a_selection_error() {
        let mut controller = controller();

        assert!(matches!(controller.load_for_edit(42), Err(AppError::Selection(_))));
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn update_of_vanished_row_is_silent() {
        let mut controller = controller();
        add(&mut controller, "Ada", "20", "CS1", "95.5");
        controller.select(Some(999));
        fill(&mut controller, "Ghost", "1", "X", "1");

        controller.update_selected().unwrap();

        assert_eq!(controller.rows().len(), 1);
        assert_eq!(controller.status(), "No student with ID 999; nothing changed.");
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn delete_drops_row_and_selection() {
        let mut controller = controller();
        let ada = add(&mut controller, "Ada", "20", "CS1", "95.5");
        controller.select(Some(ada));

        controller.delete_selected().unwrap();

        assert!(controller.rows().is_empty());
        assert_eq!(controller.selected(), None);
        assert_eq!(controller.status(), format!("Deleted student ID {ada}"));
    }

    #[test]
    fn search_filter_survives_mutations_until_show_all() {
        let mut controller = controller();
        add(&mut controller, "Ada", "20", "CS1", "95.5");
        add(&mut controller, "Ben", "19", "CS2", "88");

        *controller.search_text_mut() = "  Ad ".to_string();
        controller.search().unwrap();
        assert_eq!(controller.status(), "Search: 'Ad'");
        assert_eq!(controller.active_filter(), Some("Ad"));
        assert_eq!(controller.rows().len(), 1);

        add(&mut controller, "Cy", "18", "CS3", "70");
        assert_eq!(controller.rows().len(), 1);

        controller.show_all().unwrap();
        assert_eq!(controller.rows().len(), 3);
        assert_eq!(controller.status(), "Loaded 3 students (average score 84.50).");
    }

    #[test]
    fn blank_search_shows_everything() {
        let mut controller = controller();
        add(&mut controller, "Ada", "20", "CS1", "95.5");
        add(&mut controller, "Ben", "19", "CS2", "88");

        *controller.search_text_mut() = "   ".to_string();
        controller.search().unwrap();

        assert_eq!(controller.active_filter(), None);
        assert_eq!(controller.rows().len(), 2);
    }

    #[test]
    fn keyboard_selection_clamps_to_snapshot() {
        let mut controller = controller();
        let a = add(&mut controller, "A", "1", "X", "1");
        let b = add(&mut controller, "B", "1", "X", "1");
        let c = add(&mut controller, "C", "1", "X", "1");

        controller.select_offset(1);
        assert_eq!(controller.selected(), Some(a));
        controller.select_offset(5);
        assert_eq!(controller.selected(), Some(c));
        controller.select_offset(-1);
        assert_eq!(controller.selected(), Some(b));
        controller.select_first();
        assert_eq!(controller.selected(), Some(a));
        controller.select_last();
        assert_eq!(controller.selected(), Some(c));
    }

    #[test]
    fn export_ignores_search_filter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.csv");
        let mut controller = controller();
        add(&mut controller, "Ada", "20", "CS1", "95.5");
        add(&mut controller, "Ben", "19", "CS2", "88");
        *controller.search_text_mut() = "Ben".to_string();
        controller.search().unwrap();

        let written = controller.export(ExportKind::Csv, &path).unwrap();

        assert_eq!(written, 2);
        assert_eq!(controller.status(), "Exported CSV: students.csv");
    }

    #[test]
    fn export_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.pdf");
        let mut controller = controller();

        let err = controller.export(ExportKind::Report, &path).unwrap_err();

        assert!(matches!(err, AppError::Export(_)));
    }

    #[test]
    fn commands_after_shutdown_fail_with_storage_error() {
        let mut controller = controller();
        controller.shutdown().unwrap();
        controller.shutdown().unwrap();

        assert!(matches!(
            controller.refresh(),
            Err(AppError::Storage(StorageError::Closed))
        ));
        assert_eq!(controller.status(), LOAD_FAILED);
    }

    #[test]
    fn add_stands_when_the_reload_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.db");
        let mut controller = Controller::new(StudentStore::open(&path).unwrap());
        controller.refresh().unwrap();

        // A row the store cannot decode makes every later fetch fail.
        let raw = rusqlite::Connection::open(&path).unwrap();
        raw.execute(
            "INSERT INTO students (name, age, class, score) VALUES ('Bad', 'old', 'A', 1.0)",
            [],
        )
        .unwrap();
        drop(raw);

        fill(&mut controller, "Ada", "20", "CS1", "95.5");
        let err = controller.add().unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(controller.form(), &StudentForm::default());
        assert_eq!(controller.status(), "Added student 'Ada' (table not refreshed)");
        controller.shutdown().unwrap();

        let raw = rusqlite::Connection::open(&path).unwrap();
        let added: i64 = raw
            .query_row("SELECT COUNT(*) FROM students WHERE name = 'Ada'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(added, 1);
    }
}
