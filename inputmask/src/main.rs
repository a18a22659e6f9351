// inputmask/src/main.rs
//! inputmask entry point.
//!
//! Parses the command line, sets up logging and dispatches to the command runner.
//! Exit status: 0 on success, 1 when `validate` or `check` rejected input, 2 on error.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use is_terminal::IsTerminal;
use log::LevelFilter;

use inputmask::cli::Cli;
use inputmask::commands::{self, EXIT_ERROR};
use inputmask::logger;
use inputmask::ui::output_format;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    match commands::run_stdout(&cli, io::stdout().is_terminal()) {
        Ok(code) => code,
        Err(e) => {
            output_format::print_error_message(&format!("{:#}", e), io::stderr().is_terminal());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
