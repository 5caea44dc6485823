//! Binary entry point that glues the SQLite-backed shelf to the TUI: resolve
//! paths, start logging, open the store and drive the Ratatui event loop until
//! the user exits.
use anyhow::Context;
use cookbook_shelf::logging::init_logging;
use cookbook_shelf::{open_store, run_app, App, Config};

/// Returning a `Result` bubbles fatal initialization problems (an unreadable
/// database file, a missing home directory) up to the terminal instead of
/// crashing silently.
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _log_guard = init_logging(&config.log_dir)?;
    tracing::info!(db = %config.db_path.display(), "starting cookbook shelf");

    let conn = open_store(&config.db_path).context("failed to initialise the cookbook shelf")?;
    let mut app = App::load(conn)?;

    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!("cookbook shelf stopped: {err:#}");
    }
    result
}
