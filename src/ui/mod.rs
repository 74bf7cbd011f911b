//! Ratatui front-end: an input row, the student table and a status footer,
//! with modal dialogs for confirmations, export destinations and errors.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
