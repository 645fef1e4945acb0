//! CLI argument definitions using clap

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::domain::Units;

/// Minimal CLI host: layered configuration, routed commands, stable exit codes
#[derive(Parser, Debug)]
#[command(name = "archetype")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true, disable_help_subcommand = true)]
pub struct Cli {
    /// Print help
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue, global = true)]
    pub help: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    pub version: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Print a greeting
    Hello {
        /// Name to greet
        #[arg(short = 'n', long, value_parser = non_blank)]
        name: String,
    },

    /// Show current weather for coordinates or the caller's location
    Weather {
        /// Latitude in decimal degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true, value_parser = latitude)]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true, value_parser = longitude)]
        lon: Option<f64>,

        /// Seconds each outbound call may take
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,

        /// Unit system
        #[arg(long, value_enum, default_value_t = UnitsArg::Metric)]
        units: UnitsArg,

        /// Print the provider JSON instead of a report
        #[arg(long)]
        raw: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the resolved configuration as TOML
    Show,
    /// Print the configuration directory and candidate files
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsArg {
    /// °C, km/h
    Metric,
    /// °F, mph
    Imperial,
}

impl From<UnitsArg> for Units {
    fn from(value: UnitsArg) -> Self {
        match value {
            UnitsArg::Metric => Units::Metric,
            UnitsArg::Imperial => Units::Imperial,
        }
    }
}

impl Commands {
    /// Command path for diagnostics, e.g. `config show`.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Hello { .. } => "hello",
            Commands::Weather { .. } => "weather",
            Commands::Config {
                command: ConfigCommands::Show,
            } => "config show",
            Commands::Config {
                command: ConfigCommands::Path,
            } => "config path",
        }
    }
}

fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        Err("--name must be a non-empty value".to_string())
    } else {
        Ok(value.to_string())
    }
}

fn latitude(value: &str) -> Result<f64, String> {
    bounded(value, 90.0)
}

fn longitude(value: &str) -> Result<f64, String> {
    bounded(value, 180.0)
}

fn bounded(value: &str, limit: f64) -> Result<f64, String> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if parsed.is_finite() && (-limit..=limit).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!("must be between -{limit} and {limit}"))
    }
}
