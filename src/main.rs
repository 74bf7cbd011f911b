//! Binary entry point: resolve configuration, start logging, open the student
//! database and drive the terminal UI until the user quits.
use anyhow::Context;
use student_manager::logging::init_logging;
use student_manager::{run_app, App, Config, Controller, StudentStore};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_path)?;
    info!(db = %config.db_path.display(), "starting student manager");

    let store = StudentStore::open(&config.db_path).context("failed to open student database")?;
    let mut app = App::new(Controller::new(store), config.export_dir);
    app.load();

    let result = run_app(&mut app);
    if let Err(err) = app.shutdown() {
        error!(error = %err, "failed to close student database");
    }
    result
}
