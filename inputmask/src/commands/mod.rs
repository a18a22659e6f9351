// inputmask/src/commands/mod.rs
//! Command dispatch for the inputmask CLI.
//! License: MIT OR APACHE 2.0

pub mod aliases;
pub mod mask;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::debug;

use inputmask_core::{load_config_by_name, merge_configs, validate_config, MaskConfig};

use crate::cli::{Cli, Commands};

/// Exit status for a `validate` or `check` run whose values were rejected.
pub const EXIT_REJECTED: u8 = 1;
/// Exit status for usage, configuration and I/O errors.
pub const EXIT_ERROR: u8 = 2;

/// Loads the built-in configuration, merging the one named by `--config` over it.
pub fn load_config(config: Option<&str>) -> Result<MaskConfig> {
    let defaults = MaskConfig::load_default().context("Failed to load the built-in configuration")?;
    let user = match config {
        Some(name) => Some(
            load_config_by_name(name)
                .with_context(|| format!("Failed to load configuration '{}'", name))?,
        ),
        None => None,
    };
    let merged = merge_configs(defaults, user);
    validate_config(&merged)?;
    debug!(
        "Active configuration: {} definitions, {} aliases.",
        merged.definitions.len(),
        merged.aliases.len()
    );
    Ok(merged)
}

/// Runs the parsed command, writing results to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W, supports_color: bool) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let accepted = match &cli.command {
        Commands::Format(cmd) => mask::run_format(cmd, &config, out).map(|_| true)?,
        Commands::Unmask(cmd) => mask::run_unmask(cmd, &config, out).map(|_| true)?,
        Commands::Validate(cmd) => mask::run_validate(cmd, &config, out, supports_color)?,
        Commands::Template(cmd) => mask::run_template(cmd, &config, out).map(|_| true)?,
        Commands::Check(cmd) => mask::run_check(cmd, &config, out)?,
        Commands::Aliases(cmd) => aliases::run_aliases(cmd, &config, out).map(|_| true)?,
    };
    out.flush()?;
    Ok(if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    })
}

/// Runs against the process stdout.
pub fn run_stdout(cli: &Cli, supports_color: bool) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    run(cli, &mut handle, supports_color)
}
