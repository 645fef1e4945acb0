//! Command routing
//!
//! Every invocation passes through [`run`], which always produces exactly one
//! exit code:
//!
//! 1. Help and version markers are found by scanning the raw tokens, so a
//!    malformed command line still honours them. Help wins over version; no
//!    arguments at all means help.
//! 2. Parse and validation failures print one error line and exit 2 without
//!    running a handler.
//! 3. Handlers run behind a panic boundary; an escaped panic prints a generic
//!    line and exits 4. Returned errors exit with their own code.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tracing::{debug, debug_span, error, Instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::commands::execute_command;
use crate::cli::output::Console;
use crate::cli::{CliError, CliResult};
use crate::exitcode;
use crate::infrastructure::AppContext;

pub const HELP_MARKERS: [&str; 3] = ["-h", "--help", "-?"];
pub const VERSION_MARKERS: [&str; 2] = ["-v", "--version"];

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

const BIN_NAME: &str = "archetype";

/// Runs a parsed command. [`run`] uses [`execute_command`].
pub type Handler =
    for<'a> fn(&'a AppContext, Commands, &'a mut Console) -> LocalBoxFuture<'a, CliResult<()>>;

fn default_handler<'a>(
    ctx: &'a AppContext,
    command: Commands,
    console: &'a mut Console,
) -> LocalBoxFuture<'a, CliResult<()>> {
    Box::pin(execute_command(ctx, command, console))
}

/// What one invocation will do, decided before any handler runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Print usage for the given command path (empty for the root).
    Help(Vec<String>),
    Version,
    /// Parse or validation failure, with the message to show.
    Invalid(String),
    Run(Commands),
}

impl Decision {
    /// Name recorded on the diagnostic span.
    pub fn command_name(&self) -> String {
        match self {
            Decision::Help(path) if path.is_empty() => "help".to_string(),
            Decision::Help(path) => format!("help {}", path.join(" ")),
            Decision::Version => "version".to_string(),
            Decision::Invalid(_) => "invalid".to_string(),
            Decision::Run(command) => command.name().to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Markers {
    help: bool,
    version: bool,
}

/// Raw token scan. Tokens after `--` are values, never markers.
fn scan(tokens: &[String]) -> Markers {
    let mut markers = Markers::default();
    for token in tokens.iter().take_while(|t| t.as_str() != "--") {
        markers.help |= HELP_MARKERS.contains(&token.as_str());
        markers.version |= VERSION_MARKERS.contains(&token.as_str());
    }
    markers
}

/// Decide the outcome for `tokens` (program name excluded). Pure.
pub fn decide(tokens: &[String]) -> Decision {
    let markers = scan(tokens);
    if tokens.is_empty() || markers.help {
        return Decision::Help(command_path(tokens));
    }
    if markers.version {
        return Decision::Version;
    }

    let argv = std::iter::once(BIN_NAME.to_string()).chain(tokens.iter().cloned());
    match Cli::try_parse_from(argv) {
        Ok(Cli {
            command: Some(command),
            ..
        }) => Decision::Run(command),
        Ok(Cli { command: None, .. }) => Decision::Help(Vec::new()),
        Err(e) => Decision::Invalid(parse_error_message(&e, &command_path(tokens))),
    }
}

/// Subcommand names named by `tokens`, outermost first.
pub fn command_path(tokens: &[String]) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = Cli::command();
    for token in tokens.iter().filter(|t| !t.starts_with('-')) {
        let Some(sub) = current.find_subcommand(token) else {
            continue;
        };
        path.push(sub.get_name().to_string());
        let sub = sub.clone();
        current = sub;
    }
    path
}

/// Usage text for a command path.
pub fn render_help(path: &[String]) -> String {
    let mut current = Cli::command().bin_name(BIN_NAME);
    current.build();
    for name in path {
        let Some(sub) = current.find_subcommand(name) else {
            break;
        };
        let sub = sub.clone();
        current = sub;
    }
    current.render_help().to_string()
}

/// One-line message for a clap failure. Unrecognized tokens are named
/// explicitly; anything else keeps clap's first paragraph.
pub fn parse_error_message(err: &clap::Error, path: &[String]) -> String {
    let unrecognized = match err.kind() {
        ErrorKind::InvalidSubcommand => err
            .get(ContextKind::InvalidSubcommand)
            .map(|token| ("command", token)),
        ErrorKind::UnknownArgument => err.get(ContextKind::InvalidArg).map(|token| ("argument", token)),
        _ => None,
    };
    if let Some((what, ContextValue::String(token))) = unrecognized {
        return format!("unrecognized {what} '{token}'");
    }

    if matches!(
        err.kind(),
        ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) {
        return match path.last() {
            Some(name) => format!("'{name}' requires a subcommand"),
            None => "a subcommand is required".to_string(),
        };
    }

    let rendered = err.to_string();
    let first = rendered.split("\n\n").next().unwrap_or_default();
    let text = first
        .trim()
        .trim_start_matches("error:")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        "invalid arguments".to_string()
    } else {
        text
    }
}

/// Route one invocation and return its exit code.
pub async fn run<I, T>(ctx: &AppContext, console: &mut Console, tokens: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    run_with(ctx, console, tokens, default_handler).await
}

/// [`run`] with an explicit handler.
pub async fn run_with<I, T>(ctx: &AppContext, console: &mut Console, tokens: I, handler: Handler) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    let decision = decide(&tokens);
    let span = debug_span!("cli", cmd = %decision.command_name(), args = ?tokens);

    async move {
        debug!(?decision, "routing");
        let code = match decision {
            Decision::Help(path) => emit(console, render_help(&path).trim_end()),
            Decision::Version => emit(console, env!("CARGO_PKG_VERSION")),
            Decision::Invalid(message) => report(console, &CliError::InvalidArgs(message)),
            Decision::Run(command) => dispatch(ctx, console, command, handler).await,
        };
        debug!(exit_code = code, "done");
        code
    }
    .instrument(span)
    .await
}

async fn dispatch(ctx: &AppContext, console: &mut Console, command: Commands, handler: Handler) -> i32 {
    // Panics raised while building the future are caught too.
    let outcome = AssertUnwindSafe(async { handler(ctx, command, console).await })
        .catch_unwind()
        .await;
    match outcome {
        Ok(Ok(())) => exitcode::SUCCESS,
        Ok(Err(e)) => report(console, &e),
        Err(payload) => {
            error!("command panicked: {}", panic_message(payload.as_ref()));
            console.error(UNEXPECTED_ERROR_MESSAGE, None);
            exitcode::UNEXPECTED
        }
    }
}

/// Print `e` and return its exit code.
fn report(console: &mut Console, e: &CliError) -> i32 {
    debug!(error = %e, exit_code = e.exit_code(), "command failed");
    console.error(&e.to_string(), e.correlation_id());
    e.exit_code()
}

fn emit(console: &mut Console, text: &str) -> i32 {
    match console.line(text) {
        Ok(()) => exitcode::SUCCESS,
        Err(e) => {
            error!("failed to write output: {e}");
            exitcode::UNEXPECTED
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
