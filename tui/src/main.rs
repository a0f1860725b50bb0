use clap::Parser;
use quill_tui::Cli;
use quill_tui::run_main;

fn main() -> color_eyre::Result<()> {
    run_main(Cli::parse())
}
