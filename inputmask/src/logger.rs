// inputmask/src/logger.rs
//! Logger setup for the inputmask CLI.
//!
//! `RUST_LOG` is honoured unless an explicit level is passed (from `--debug` or
//! `--quiet`). Logs go to stderr so stdout only carries command output.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initialises `env_logger`. Calling it more than once is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).target(Target::Stderr);
    let _ = builder.try_init();
}
