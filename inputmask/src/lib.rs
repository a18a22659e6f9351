// inputmask/src/lib.rs
//! # inputmask CLI Application
//!
//! This crate provides the command-line interface for the `inputmask-core` engine:
//! formatting, unmasking and validating values, printing templates and replaying
//! single edits against a buffer.

pub mod commands;
pub mod cli;
pub mod ui;
pub mod logger;

pub use commands::run;
