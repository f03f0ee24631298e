//! Command implementations for the CLI.
//!
//! Each module holds the full implementation of a command; the binaries
//! under `src/bin` are thin wrappers.

pub mod base;
pub mod common;
pub mod completions;
pub mod lot;
pub mod obfuscate;
