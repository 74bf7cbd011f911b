//! Runtime configuration resolved from environment variables, with defaults
//! rooted in the user's home directory.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::{BaseDirs, UserDirs};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".student-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "students.db";
/// Log file written next to the database.
const LOG_FILE_NAME: &str = "student-manager.log";

const DB_ENV: &str = "STUDENT_MANAGER_DB";
const EXPORT_DIR_ENV: &str = "STUDENT_MANAGER_EXPORT_DIR";
const LOG_ENV: &str = "STUDENT_MANAGER_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Directory used when suggesting export destinations.
    pub export_dir: PathBuf,
    /// Append-only log file. The terminal UI owns stdout, so logs go here.
    pub log_path: PathBuf,
}

impl Config {
    /// Resolve the configuration.
    ///
    /// Optional environment variables:
    /// - `STUDENT_MANAGER_DB`: database file (default `~/.student-manager/students.db`)
    /// - `STUDENT_MANAGER_EXPORT_DIR`: export directory (default: documents dir, else cwd)
    /// - `STUDENT_MANAGER_LOG`: log file (default: next to the database)
    ///
    /// # Errors
    ///
    /// Returns an error if no override is set and the home directory cannot be
    /// located.
    pub fn from_env() -> Result<Self> {
        let db_path = match env::var_os(DB_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_data_dir()?.join(DB_FILE_NAME),
        };

        let export_dir = env::var_os(EXPORT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_export_dir);

        let log_path = env::var_os(LOG_ENV).map(PathBuf::from).unwrap_or_else(|| {
            db_path
                .parent()
                .map(|dir| dir.join(LOG_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
        });

        Ok(Self {
            db_path,
            export_dir,
            log_path,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

fn default_export_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(PathBuf::from))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
