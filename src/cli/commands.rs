//! Command dispatch
//!
//! Handlers receive already-validated options, do their work through the
//! application services and write results to the console. Failures are
//! returned, never printed here.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::application::services::{greet, render_config, ConfigLocations, WeatherOutcome, WeatherRequest, WeatherService};
use crate::cli::args::{Commands, ConfigCommands};
use crate::cli::output::Console;
use crate::cli::CliResult;
use crate::domain::render_report;
use crate::infrastructure::{AppContext, InfraError};

pub async fn execute_command(ctx: &AppContext, command: Commands, console: &mut Console) -> CliResult<()> {
    match command {
        Commands::Hello { name } => hello(&name, console),
        Commands::Weather {
            lat,
            lon,
            timeout,
            units,
            raw,
        } => {
            let request = WeatherRequest {
                coordinates: lat.zip(lon),
                timeout: timeout.map(Duration::from_secs),
                units: units.into(),
                raw,
            };
            weather(ctx, &request, console).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_show(ctx, console),
            ConfigCommands::Path => config_path(ctx, console),
        },
    }
}

fn hello(name: &str, console: &mut Console) -> CliResult<()> {
    write_line(console, &greet(name))
}

#[instrument(level = "debug", skip(ctx, console))]
async fn weather(ctx: &AppContext, request: &WeatherRequest, console: &mut Console) -> CliResult<()> {
    let service = WeatherService::new(ctx.geoip_client()?, ctx.weather_client()?, ctx.classifier());
    match service.current(request).await? {
        WeatherOutcome::Raw(body) => write_line(console, body.trim_end()),
        WeatherOutcome::Report(report) => write_line(console, &render_report(&report)),
    }
}

fn config_show(ctx: &AppContext, console: &mut Console) -> CliResult<()> {
    let text = render_config(ctx.config())?;
    console
        .raw(&text)
        .map_err(|e| InfraError::io("writing output", e))?;
    Ok(())
}

fn config_path(ctx: &AppContext, console: &mut Console) -> CliResult<()> {
    let locations = ConfigLocations::discover(ctx.sources());
    debug!(layers = ?ctx.resolution().layers, "applied layers");
    write_line(console, &locations.render())
}

fn write_line(console: &mut Console, text: &str) -> CliResult<()> {
    console
        .line(text)
        .map_err(|e| InfraError::io("writing output", e))?;
    Ok(())
}
