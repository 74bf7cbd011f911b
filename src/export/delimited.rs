use std::fs::File;
use std::path::Path;

use crate::error::ExportError;
use crate::models::Student;

use super::HEADERS;

/// Write `students` as CSV with a fixed header row. Fields containing
/// delimiters, quotes or newlines are quoted by the writer.
pub fn write_csv(path: &Path, students: &[Student]) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(HEADERS)?;
    for student in students {
        writer.write_record([
            student.id.to_string(),
            student.name.clone(),
            student.age.to_string(),
            student.class_name.clone(),
            student.score.to_string(),
            student.date_added_display().to_string(),
        ])?;
    }

    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
