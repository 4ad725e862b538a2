//! CLI module
//!
//! Command-line interface following the Singer tap conventions.
//!
//! # Modes
//!
//! - `--discover` - print the catalog of known streams
//! - sync (default) - write SCHEMA, RECORD and STATE messages to stdout

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;

#[cfg(test)]
mod tests;
