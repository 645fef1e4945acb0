//! CLI layer: argument parsing, routing and command dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod output;
pub mod router;

pub use args::{Cli, Commands, ConfigCommands};
pub use error::{CliError, CliResult};
pub use output::Console;
pub use router::{decide, run, Decision};
