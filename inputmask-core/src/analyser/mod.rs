// File: inputmask-core/src/analyser/mod.rs
//! Mask analysis: the lexer turns pattern strings into a syntax tree, the compiler
//! lowers that tree into a `Maskset` and caches the result.
//!
//! License: MIT OR APACHE 2.0

pub mod compiler;
pub mod lexer;

pub use compiler::{compile, default_cache, fingerprint, MasksetCache};
pub use lexer::{parse, Node};
