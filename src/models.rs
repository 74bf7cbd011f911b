//! Domain models that mirror the `students` table. They stay plain data
//! holders so the store and the controller can pass them around freely.

use std::fmt;

/// Pattern used for `date_added` when a row is inserted.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
/// A persisted student row.
pub struct Student {
    /// Surrogate key assigned by SQLite. Never reused after a delete.
    pub id: i64,
    pub name: String,
    pub age: i64,
    /// Cohort or section label, stored in the `class` column.
    pub class_name: String,
    pub score: f64,
    /// Captured once at insert. Rows created before the column existed carry
    /// `None`.
    pub date_added: Option<String>,
}

impl Student {
    /// Date added as display text, blank for legacy rows.
    pub fn date_added_display(&self) -> &str {
        self.date_added.as_deref().unwrap_or("")
    }

    /// Score with two decimals, as shown in the table and the report.
    pub fn score_display(&self) -> String {
        format!("{:.2}", self.score)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.class_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The editable subset of a student, already validated. Both inserts and
/// updates take this shape; `id` and `date_added` are owned by the store.
pub struct NewStudent {
    pub name: String,
    pub age: i64,
    pub class_name: String,
    pub score: f64,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, age: i64, class_name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            age,
            class_name: class_name.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_display_with_two_decimals() {
        let mut student = Student {
            id: 1,
            name: "Ada".to_string(),
            age: 20,
            class_name: "CS1".to_string(),
            score: 88.0,
            date_added: None,
        };
        assert_eq!(student.score_display(), "88.00");

        student.score = 95.5;
        assert_eq!(student.score_display(), "95.50");
        assert_eq!(student.to_string(), "Ada (CS1)");
    }
}
