//! Output helpers for the inputmask CLI.
//!
//! Colour is only applied when the destination is a terminal.

use std::io::{self, Write};

use anyhow::Result;
use owo_colors::OwoColorize;

/// Writes a `valid` / `invalid` marker followed by the value.
pub fn print_verdict<W: Write>(out: &mut W, valid: bool, value: &str, supports_color: bool) -> Result<()> {
    let marker = if valid { "valid" } else { "invalid" };
    if supports_color {
        if valid {
            writeln!(out, "{}\t{}", marker.green(), value)?;
        } else {
            writeln!(out, "{}\t{}", marker.red(), value)?;
        }
    } else {
        writeln!(out, "{}\t{}", marker, value)?;
    }
    Ok(())
}

/// Writes an error message to stderr.
pub fn print_error_message(message: &str, supports_color: bool) {
    let mut stderr = io::stderr();
    let _ = if supports_color {
        writeln!(stderr, "{} {}", "error:".red().bold(), message)
    } else {
        writeln!(stderr, "error: {}", message)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_verdicts() -> Result<()> {
        let mut out = Vec::new();
        print_verdict(&mut out, true, "01/02/2024", false)?;
        print_verdict(&mut out, false, "01/02", false)?;
        assert_eq!(String::from_utf8(out)?, "valid\t01/02/2024\ninvalid\t01/02\n");
        Ok(())
    }

    #[test]
    fn test_colored_verdict_contains_escape() -> Result<()> {
        let mut out = Vec::new();
        print_verdict(&mut out, true, "x", true)?;
        assert!(String::from_utf8(out)?.contains('\u{1b}'));
        Ok(())
    }
}
