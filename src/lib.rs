//! Core library surface for the Student Manager TUI application.
//!
//! The record store owns the SQLite table, the controller mediates every user
//! command, and the `ui` module binds both to a terminal. The binary only wires
//! them together.
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod ui;

pub use config::Config;
pub use controller::Controller;
pub use db::StudentStore;
pub use error::{AppError, ExportError, StorageError};
pub use models::{NewStudent, Student};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
