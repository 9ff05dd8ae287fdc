//! Binary entry point: resolve settings, start logging, open the library, then
//! either run a single headless command or hand control to the TUI.
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use personal_library_manager::config::{Cli, Command, Settings};
use personal_library_manager::logging::init_logging;
use personal_library_manager::{dispatch, run_app, App, Library};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;
    let _log_guard = init_logging(&settings.log_dir, &settings.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting personal library manager");

    let library = Library::open(&settings.database).context("failed to open library")?;

    match cli.command {
        Some(command) => run_command(&library, command),
        None => {
            let books = library.fetch_all().context("failed to load books")?;
            let mut app = App::new(library, books);
            run_app(&mut app)
        }
    }
}

/// Run one subcommand through the dispatch table and print the outcome.
fn run_command(library: &Library, command: Command) -> Result<()> {
    let action = command.into_action()?;
    println!("{}", dispatch(library, action)?);
    Ok(())
}
