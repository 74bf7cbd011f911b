//! Error taxonomy shared by the store, the controller and the exporters.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the SQLite-backed record store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("the student database is closed")]
    Closed,
}

/// Failures raised while writing an export file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not build PDF report: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Everything a user command can fail with. Validation and selection problems
/// are warnings caught before the store is touched; storage and export
/// failures are reported as errors and leave the app usable.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Selection(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl AppError {
    /// Dialog title used when the error is shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Input Error",
            AppError::Selection(_) => "Selection Error",
            AppError::Storage(_) => "Database Error",
            AppError::Export(_) => "Export Error",
        }
    }

    /// Warnings are user mistakes; everything else is a failure of the system.
    pub fn is_warning(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::Selection(_))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn pdf_failures_keep_their_source() {
        let export = ExportError::from(lopdf::Error::CharacterEncoding);
        assert!(export.source().is_some());

        let err = AppError::from(export);
        assert_eq!(err.title(), "Export Error");
        assert!(!err.is_warning());
        assert_eq!(
            err.to_string(),
            "could not build PDF report: invalid character encoding"
        );
    }
}
