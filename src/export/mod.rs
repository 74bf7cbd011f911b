//! Read-only export paths over the student list.

mod delimited;
mod report;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

pub use delimited::write_csv;
pub use report::write_report;

/// Column captions shared by every export format.
pub const HEADERS: [&str; 6] = ["ID", "Name", "Age", "Class", "Score", "Date Added"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Report,
}

impl ExportKind {
    pub fn label(self) -> &'static str {
        match self {
            ExportKind::Csv => "CSV",
            ExportKind::Report => "PDF",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Report => "pdf",
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            ExportKind::Csv => "students",
            ExportKind::Report => "students_report",
        }
    }

    /// File name embedding `now`, e.g. `students_20240131_142501.csv`.
    pub fn suggested_file_name(self, now: DateTime<Local>) -> String {
        format!(
            "{}_{}.{}",
            self.file_stem(),
            now.format("%Y%m%d_%H%M%S"),
            self.extension()
        )
    }

    /// Suggested destination inside `dir`.
    pub fn suggested_path(self, dir: &Path, now: DateTime<Local>) -> PathBuf {
        dir.join(self.suggested_file_name(now))
    }
}
