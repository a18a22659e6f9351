//! # inputmask Core Library
//!
//! `inputmask-core` provides the platform-independent logic for masked text input: it
//! turns a mask pattern (a date, a phone number, a custom token grammar) plus a table of
//! character definitions into a compiled `Maskset`, and validates edits against it
//! character by character so the edited text always conforms to the pattern.
//!
//! The library is pure and synchronous. The only shared state is the maskset cache,
//! which publishes immutable compiled masksets.
//!
//! ## Modules
//!
//! * `definitions`: Character-acceptance rules (`9`, `a`, `*`, and user definitions).
//! * `config`: Option structures and the YAML configuration document.
//! * `aliases`: Named option presets and their resolution.
//! * `analyser`: Mask lexer, compiler and the maskset cache.
//! * `maskset`: The compiled token layout.
//! * `buffer`: The per-value edit state and its rendering.
//! * `validation`: `check_val`, the incremental validation engine.
//! * `completeness`: Completeness checks, optional tail trimming and unmasking.
//! * `engine`: The `Mask` handle and the `MaskHooks` host seam.
//! * `headless`: One-shot helpers.
//!
//! ## Public API
//!
//! **Configuration**
//!
//! * [`MaskConfig`]: Definitions, aliases and defaults, loaded from YAML.
//! * [`MaskOptions`] / [`MaskOverrides`]: Resolved and partial per-mask options.
//! * [`merge_configs`]: Merges a user configuration over the built-in one.
//!
//! **Compilation**
//!
//! * [`compile`]: Compiles options into a [`Maskset`].
//! * [`MasksetCache`]: Thread-safe cache of compiled masksets.
//!
//! **Editing**
//!
//! * [`Buffer`]: Template creation, `check_val`, `is_complete`, `clear_optional_tail`, `unmask`.
//! * [`Mask`]: Formatting, validity checks and unmasking of whole values.
//!
//! ## Usage Example
//!
//! ```rust
//! use inputmask_core::{Mask, MaskConfig, PatternSpec};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = MaskConfig::load_default()?;
//!     let mask = Mask::from_config(&PatternSpec::from("99/99/9999"), &config)?;
//!
//!     let mut buffer = mask.buffer();
//!     let outcome = buffer.check_val(0, true, &['0', '1', '0', '2']);
//!     assert!(outcome.success);
//!     assert_eq!(buffer.render(), "01/02/____");
//!     assert!(!buffer.is_complete());
//!
//!     assert_eq!(mask.format("01022024").value, "01/02/2024");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Compilation problems are reported as [`MaskError`]. Rejected input is not an error:
//! it is the `success = false` outcome of `check_val`. Configuration loading and the
//! headless helpers return `anyhow::Result`.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod aliases;
pub mod analyser;
pub mod buffer;
pub mod completeness;
pub mod config;
pub mod definitions;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod maskset;
pub mod validation;

/// Re-exports the configuration types and functions.
pub use config::{
    config_candidate_paths,
    load_config_by_name,
    merge_configs,
    validate_config,
    MarkerPair,
    MaskConfig,
    MaskOptions,
    MaskOverrides,
    MaskSource,
    MetadataEntry,
    DEFAULT_MAX_LENGTH,
    MAX_PATTERN_LENGTH,
};

/// Re-exports the custom error type.
pub use errors::MaskError;

pub use aliases::{AliasRegistry, PatternSpec};
pub use analyser::{compile, default_cache, MasksetCache};
pub use buffer::{template, Buffer, Cell, Direction};
pub use definitions::{Casing, Definition, DefinitionSpec, DefinitionTable};
pub use engine::{Formatted, Mask, MaskHooks, NoHooks};
pub use maskset::{Maskset, MaskToken, TokenKind};
pub use validation::{check_val, CheckOutcome};

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{empty_mask, format_value, is_valid_value, unmask_value};
