//! Persistence layer around the embedded SQLite database.

mod connection;
mod students;

pub use connection::{ensure_schema, open_connection};
pub use students::StudentStore;
