// File: inputmask-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot use of the engine without keeping a `Mask` around.
//! Each helper resolves the pattern against a configuration, compiles it through the
//! shared maskset cache and applies a single operation.

use anyhow::{Context, Result};

use crate::aliases::PatternSpec;
use crate::config::MaskConfig;
use crate::engine::{Formatted, Mask};

fn build(spec: &PatternSpec, config: &MaskConfig) -> Result<Mask> {
    Mask::from_config(spec, config).with_context(|| format!("Failed to build mask for {:?}", spec))
}

/// Formats `value` with the mask named by `spec`.
pub fn format_value(spec: &PatternSpec, config: &MaskConfig, value: &str) -> Result<Formatted> {
    Ok(build(spec, config)?.format(value))
}

/// Unmasks `value` with the mask named by `spec`.
pub fn unmask_value(spec: &PatternSpec, config: &MaskConfig, value: &str) -> Result<String> {
    Ok(build(spec, config)?.unmask_value(value))
}

/// Checks whether `value` is a complete, correctly formatted value for `spec`.
pub fn is_valid_value(spec: &PatternSpec, config: &MaskConfig, value: &str) -> Result<bool> {
    Ok(build(spec, config)?.is_valid(value))
}

/// The rendered template of the mask named by `spec`.
pub fn empty_mask(spec: &PatternSpec, config: &MaskConfig) -> Result<String> {
    Ok(build(spec, config)?.empty_mask())
}
