// Forbid accidental stdout/stderr writes in the library portion of the TUI;
// the terminal owns those streams while the alternate screen is active.
#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::app::App;

mod app;
mod app_event;
mod app_event_sender;
mod cli;
mod composer;
mod focus;
mod transcript;
mod tui;

pub use cli::Cli;

pub fn run_main(cli: Cli) -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _log_guard = init_logging(cli.log_file.clone())?;

    // Route panic reports through tracing so they land in the log file
    // instead of the alternate screen.
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));

    let mut terminal = tui::init()?;
    let result = App::new(cli).run(&mut terminal);
    restore_terminal();
    result
}

fn init_logging(log_file: Option<PathBuf>) -> color_eyre::Result<WorkerGuard> {
    let path = log_file.unwrap_or_else(|| std::env::temp_dir().join("quill-tui.log"));
    let log_file = OpenOptions::new().create(true).append(true).open(path)?;
    let (writer, guard) = non_blocking(log_file);

    // Use the RUST_LOG env var when set, default to info for this crate.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill_tui=info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_filter(env_filter);
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}

#[expect(
    clippy::print_stderr,
    reason = "the alternate screen has been left at this point"
)]
fn restore_terminal() {
    if let Err(err) = tui::restore() {
        eprintln!("failed to restore terminal, run `reset` to recover: {err}");
    }
}
