//! Docfill CLI library.
//!
//! This library provides the pieces of the `docfill` binary: argument parsing,
//! run configuration, the fill run itself, and output formatting.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod run;

pub use cli::{Cli, CliFormat};
pub use config::{EngineSettings, Provider, RunConfig};
pub use error::{CliError, Result};
pub use output::Formatter;
