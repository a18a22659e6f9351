//! errors.rs - Custom error types for the inputmask-core library.
//!
//! `MaskError` covers everything that can go wrong while turning a configuration into a
//! compiled `Maskset`: malformed patterns, broken definitions and alias resolution.
//! Rejected input characters are not errors; they are reported through
//! `CheckOutcome::success`.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All error types produced by the `inputmask-core` library.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream `match` statements.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MaskError {
    #[error("Unmatched '{delimiter}' at position {position} in mask '{pattern}'")]
    UnmatchedDelimiter {
        pattern: String,
        delimiter: char,
        position: usize,
    },

    #[error("Escape character at the end of mask '{pattern}'")]
    DanglingEscape { pattern: String },

    #[error("Invalid quantifier '{quantifier}' at position {position} in mask '{pattern}'")]
    InvalidQuantifier {
        pattern: String,
        quantifier: String,
        position: usize,
    },

    #[error("Mask '{0}' nests an unbounded quantifier inside another unbounded quantifier")]
    NestedUnboundedRepeat(String),

    #[error("Mask '{pattern}' expands to {positions} positions, exceeding the maximum of {max}")]
    MaskTooLong {
        pattern: String,
        positions: usize,
        max: usize,
    },

    #[error("Mask pattern length ({0}) exceeds maximum allowed ({1})")]
    PatternLengthExceeded(usize, usize),

    #[error("Failed to compile definition '{0}': {1}")]
    DefinitionCompilationError(char, regex::Error),

    #[error("Invalid definition '{symbol}': {reason}")]
    InvalidDefinition { symbol: char, reason: String },

    #[error("No mask pattern configured")]
    MissingMask,

    #[error("Alias '{0}' is not registered")]
    UnknownAlias(String),

    #[error("Alias '{0}' refers back to itself")]
    AliasCycle(String),

    #[error("Failed to serialize configuration for hashing: {0}")]
    SerializationError(String),
}
