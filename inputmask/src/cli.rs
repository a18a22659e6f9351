// inputmask/src/cli.rs
//! This file defines the command-line interface (CLI) for the inputmask application,
//! including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "inputmask",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Format, validate and unmask values against input masks",
    long_about = "inputmask applies input masks (dates, phone numbers, custom token grammars) to values given as arguments or read line by line from stdin. It formats raw input into the mask's shape, strips masks back to their raw values, validates complete values and shows how an incremental edit would be accepted.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all log output.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Configuration file, or the name of one in the standard locations.
    #[arg(
        long = "config",
        value_name = "FILE|NAME",
        global = true,
        env = "INPUTMASK_CONFIG",
        help = "Path to a YAML configuration merged over the built-in definitions and aliases, or its name in ~/.inputmask, the config dir or ./config."
    )]
    pub config: Option<String>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `inputmask` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Formats raw values into the mask's shape.
    #[command(about = "Format raw values into the mask's shape.")]
    Format(FormatCommand),

    /// Strips masks from values.
    #[command(about = "Strip the mask from values, keeping only what was entered.")]
    Unmask(ValueCommand),

    /// Checks that values are complete and already formatted.
    #[command(about = "Check that values are complete and correctly formatted (exit status 1 otherwise).")]
    Validate(ValueCommand),

    /// Prints the empty template of a mask.
    #[command(about = "Print the empty template of a mask.")]
    Template(TemplateCommand),

    /// Applies an edit to a buffer and reports the outcome.
    #[command(about = "Apply typed input at a caret position and report how the engine placed it.")]
    Check(CheckCommand),

    /// Lists the available aliases.
    #[command(about = "List the built-in and configured aliases.")]
    Aliases(AliasesCommand),
}

/// Mask selection shared by every mask command.
#[derive(Args, Debug, Clone, Default)]
pub struct MaskArgs {
    /// Mask pattern. Repeat to give alternative patterns.
    #[arg(long = "mask", short = 'm', value_name = "PATTERN", help = "Mask pattern, e.g. '99/99/9999'. Repeat for a multi-pattern mask.")]
    pub mask: Vec<String>,

    /// Alias to start from.
    #[arg(long = "alias", short = 'a', value_name = "NAME", help = "Use a named alias (see `inputmask aliases`).")]
    pub alias: Option<String>,

    /// Placeholder glyphs for empty positions.
    #[arg(long = "placeholder", short = 'p', value_name = "TEXT", help = "Placeholder shown for empty positions.")]
    pub placeholder: Option<String>,

    /// Render right to left.
    #[arg(long = "rtl", help = "Render templates and buffers right to left. Formatted and unmasked values stay in logical order.")]
    pub rtl: bool,

    /// Drop literals when unmasking.
    #[arg(long = "remove-literals", help = "Leave literal characters out of unmasked values.")]
    pub remove_literals: bool,

    /// Reject characters that do not fit the current position.
    #[arg(long = "strict", help = "Do not skip positions that reject a character.")]
    pub strict: bool,
}

/// Arguments for commands that process values.
#[derive(Args, Debug, Clone)]
pub struct ValueCommand {
    #[command(flatten)]
    pub mask: MaskArgs,

    /// Emit JSON lines instead of plain text.
    #[arg(long = "json", help = "Print one JSON object per value.")]
    pub json: bool,

    /// Values to process (reads stdin lines if none are given).
    #[arg(value_name = "VALUE", help = "Values to process. Reads one value per line from stdin when omitted.")]
    pub values: Vec<String>,
}

/// Arguments for the `format` command.
#[derive(Args, Debug, Clone)]
pub struct FormatCommand {
    #[command(flatten)]
    pub args: ValueCommand,

    /// Print the metadata of the matched pattern.
    #[arg(long = "metadata", help = "Include the metadata of the matched pattern (multi-pattern masks).")]
    pub metadata: bool,
}

/// Arguments for the `template` command.
#[derive(Args, Debug, Clone)]
pub struct TemplateCommand {
    #[command(flatten)]
    pub mask: MaskArgs,
}

/// Arguments for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckCommand {
    #[command(flatten)]
    pub mask: MaskArgs,

    /// Value already in the buffer before the edit.
    #[arg(long = "initial", value_name = "VALUE", default_value = "", help = "Value placed into the buffer before the edit.")]
    pub initial: String,

    /// Caret position of the edit.
    #[arg(long = "position", value_name = "POS", default_value_t = 0, help = "Buffer position where the input is applied.")]
    pub position: usize,

    /// Emit JSON instead of plain text.
    #[arg(long = "json", help = "Print the outcome as JSON.")]
    pub json: bool,

    /// The characters to apply.
    #[arg(value_name = "INPUT", help = "Characters typed or pasted at the caret.")]
    pub input: String,
}

/// Arguments for the `aliases` command.
#[derive(Args, Debug, Clone)]
pub struct AliasesCommand {
    /// Emit JSON instead of plain text.
    #[arg(long = "json", help = "Print the aliases as JSON.")]
    pub json: bool,
}
