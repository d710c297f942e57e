//! CLI layer.
//!
//! Provides the command-line interface using clap, with commands for
//! listing ports, reading, writing and monitoring device preferences, and
//! replaying captured device output.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::{OutputFormat, format_error};
pub use parser::{Cli, Commands, FormArgs};
