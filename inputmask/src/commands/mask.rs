// inputmask/src/commands/mask.rs
//! Implementations of the mask commands: `format`, `unmask`, `validate`,
//! `template` and `check`.
//!
//! Every command resolves its `MaskArgs` into an inline `PatternSpec`, so flags
//! given on the command line override whatever an `--alias` provides.
//! License: MIT OR APACHE 2.0

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Serialize;

use inputmask_core::{
    CheckOutcome, Formatted, Mask, MaskConfig, MaskOverrides, MaskSource, PatternSpec,
};

use crate::cli::{CheckCommand, FormatCommand, MaskArgs, TemplateCommand, ValueCommand};
use crate::ui::output_format;

/// Builds the inline overrides described by the mask flags.
pub fn mask_overrides(args: &MaskArgs) -> Result<MaskOverrides> {
    if args.mask.is_empty() && args.alias.is_none() {
        bail!("A mask is required: pass --mask PATTERN or --alias NAME.");
    }
    let mask = match args.mask.as_slice() {
        [] => None,
        [single] => Some(MaskSource::Pattern(single.clone())),
        many => Some(MaskSource::Patterns(many.to_vec())),
    };
    Ok(MaskOverrides {
        mask,
        alias: args.alias.clone(),
        placeholder: args.placeholder.clone(),
        right_to_left: args.rtl.then_some(true),
        strict: args.strict.then_some(true),
        remove_literals: args.remove_literals.then_some(true),
        ..Default::default()
    })
}

/// Resolves and compiles the mask described by `args`.
pub fn build_mask(args: &MaskArgs, config: &MaskConfig) -> Result<Mask> {
    let spec = PatternSpec::Inline(mask_overrides(args)?);
    let mask = Mask::from_config(&spec, config).context("Failed to build the mask")?;
    debug!("Compiled mask with {} positions.", mask.maskset().len());
    Ok(mask)
}

/// Values given on the command line, or one per stdin line when none were given.
pub fn collect_values<R: BufRead>(values: &[String], stdin: R) -> Result<Vec<String>> {
    if !values.is_empty() {
        return Ok(values.to_vec());
    }
    info!("No values given; reading from stdin.");
    stdin
        .lines()
        .map(|line| line.context("Failed to read a value from stdin"))
        .collect()
}

fn read_values(cmd: &ValueCommand) -> Result<Vec<String>> {
    collect_values(&cmd.values, io::stdin().lock())
}

#[derive(Serialize)]
struct ValueRecord<'a, T: Serialize> {
    input: &'a str,
    #[serde(flatten)]
    result: T,
}

#[derive(Serialize)]
struct Unmasked<'a> {
    unmasked: &'a str,
}

#[derive(Serialize)]
struct Verdict {
    valid: bool,
}

fn write_json<W: Write, T: Serialize>(out: &mut W, input: &str, result: T) -> Result<()> {
    let record = ValueRecord { input, result };
    writeln!(out, "{}", serde_json::to_string(&record)?)?;
    Ok(())
}

/// `inputmask format`
pub fn run_format<W: Write>(cmd: &FormatCommand, config: &MaskConfig, out: &mut W) -> Result<()> {
    let mask = build_mask(&cmd.args.mask, config)?;
    for value in read_values(&cmd.args)? {
        let formatted = mask.format(&value);
        write_formatted(out, &value, formatted, cmd.args.json, cmd.metadata)?;
    }
    Ok(())
}

/// Writes one formatted value. Metadata is printed as a tab-separated JSON column
/// in plain mode.
pub fn write_formatted<W: Write>(
    out: &mut W,
    input: &str,
    formatted: Formatted,
    json: bool,
    with_metadata: bool,
) -> Result<()> {
    let formatted = if with_metadata {
        formatted
    } else {
        Formatted { metadata: None, ..formatted }
    };
    if json {
        return write_json(out, input, formatted);
    }
    match &formatted.metadata {
        Some(metadata) => writeln!(out, "{}\t{}", formatted.value, serde_json::to_string(metadata)?)?,
        None => writeln!(out, "{}", formatted.value)?,
    }
    Ok(())
}

/// `inputmask unmask`
pub fn run_unmask<W: Write>(cmd: &ValueCommand, config: &MaskConfig, out: &mut W) -> Result<()> {
    let mask = build_mask(&cmd.mask, config)?;
    for value in read_values(cmd)? {
        let unmasked = mask.unmask_value(&value);
        if cmd.json {
            write_json(out, &value, Unmasked { unmasked: &unmasked })?;
        } else {
            writeln!(out, "{}", unmasked)?;
        }
    }
    Ok(())
}

/// `inputmask validate`. Returns whether every value was valid.
pub fn run_validate<W: Write>(
    cmd: &ValueCommand,
    config: &MaskConfig,
    out: &mut W,
    supports_color: bool,
) -> Result<bool> {
    let mask = build_mask(&cmd.mask, config)?;
    let mut all_valid = true;
    for value in read_values(cmd)? {
        let valid = mask.is_valid(&value);
        all_valid &= valid;
        if cmd.json {
            write_json(out, &value, Verdict { valid })?;
        } else {
            output_format::print_verdict(out, valid, &value, supports_color)?;
        }
    }
    Ok(all_valid)
}

/// `inputmask template`
pub fn run_template<W: Write>(cmd: &TemplateCommand, config: &MaskConfig, out: &mut W) -> Result<()> {
    let mask = build_mask(&cmd.mask, config)?;
    writeln!(out, "{}", mask.empty_mask())?;
    Ok(())
}

#[derive(Serialize)]
struct CheckReport {
    buffer: String,
    #[serde(flatten)]
    outcome: CheckOutcome,
    complete: bool,
    unmasked: String,
}

/// `inputmask check`. Returns whether the edit was accepted.
pub fn run_check<W: Write>(cmd: &CheckCommand, config: &MaskConfig, out: &mut W) -> Result<bool> {
    let mask = build_mask(&cmd.mask, config)?;
    let mut buffer = mask.buffer();
    if !cmd.initial.is_empty() {
        let seeded = mask.input(&mut buffer, 0, &cmd.initial);
        debug!("Seeded buffer with '{}': {:?}", cmd.initial, seeded);
    }
    if cmd.position > buffer.len() {
        bail!(
            "Position {} is outside the buffer (length {}).",
            cmd.position,
            buffer.len()
        );
    }
    let outcome = mask.input(&mut buffer, cmd.position, &cmd.input);
    let report = CheckReport {
        buffer: buffer.render(),
        complete: buffer.is_complete(),
        unmasked: mask.unmask(&buffer),
        outcome,
    };

    if cmd.json {
        writeln!(out, "{}", serde_json::to_string(&report)?)?;
    } else {
        writeln!(out, "buffer:   {}", report.buffer)?;
        writeln!(out, "success:  {}", report.outcome.success)?;
        if let Some(pos) = report.outcome.failure_pos {
            writeln!(out, "failed at: {}", pos)?;
        }
        writeln!(out, "caret:    {}", report.outcome.caret)?;
        writeln!(out, "complete: {}", report.complete)?;
        writeln!(out, "unmasked: {}", report.unmasked)?;
    }
    Ok(report.outcome.success)
}
