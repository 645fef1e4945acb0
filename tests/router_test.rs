//! In-process routing tests: every invocation ends in exactly one exit code,
//! and handler failures never escape as panics.

use futures::future::LocalBoxFuture;
use tempfile::TempDir;

use archetype::application::ApplicationError;
use archetype::cli::router::{run_with, UNEXPECTED_ERROR_MESSAGE};
use archetype::cli::{run, CliError, CliResult, Commands, Console};
use archetype::domain::DomainError;
use archetype::infrastructure::AppContext;
use archetype::util::testing::{init_test_setup, settings_dir, sources};

fn context(env: &[(&str, &str)]) -> (TempDir, AppContext) {
    init_test_setup();
    let dir = settings_dir(&[]);
    let ctx = AppContext::new(sources(dir.path(), env));
    (dir, ctx)
}

fn panicking_handler<'a>(
    _ctx: &'a AppContext,
    _command: Commands,
    _console: &'a mut Console,
) -> LocalBoxFuture<'a, CliResult<()>> {
    Box::pin(explode())
}

fn failing_handler<'a>(
    _ctx: &'a AppContext,
    _command: Commands,
    _console: &'a mut Console,
) -> LocalBoxFuture<'a, CliResult<()>> {
    Box::pin(fail())
}

fn counting_handler<'a>(
    _ctx: &'a AppContext,
    _command: Commands,
    console: &'a mut Console,
) -> LocalBoxFuture<'a, CliResult<()>> {
    Box::pin(write_handled(console))
}

fn rejecting_handler<'a>(
    _ctx: &'a AppContext,
    _command: Commands,
    _console: &'a mut Console,
) -> LocalBoxFuture<'a, CliResult<()>> {
    Box::pin(reject())
}

async fn reject() -> CliResult<()> {
    Err(CliError::InvalidArgs("--name is reserved".to_string()))
}

async fn explode() -> CliResult<()> {
    panic!("handler exploded")
}

async fn fail() -> CliResult<()> {
    Err(ApplicationError::from(DomainError::MissingField("temperature")).into())
}

async fn write_handled(console: &mut Console) -> CliResult<()> {
    console.line("handled").expect("write");
    Ok(())
}

#[tokio::test]
async fn given_hello_when_running_then_greets_on_stdout_only() {
    // Arrange
    let (_dir, ctx) = context(&[]);
    let (mut console, out, err) = Console::captured();

    // Act
    let code = run(&ctx, &mut console, ["hello", "--name", "  Ada "]).await;

    // Assert
    assert_eq!(code, 0);
    assert_eq!(out.contents(), "Hello, Ada!\n");
    assert_eq!(err.contents(), "");
}

#[tokio::test]
async fn given_panicking_handler_when_running_then_generic_message_and_exit_four() {
    // Arrange
    let (_dir, ctx) = context(&[]);
    let (mut console, out, err) = Console::captured();

    // Act
    let code = run_with(&ctx, &mut console, ["hello", "--name", "x"], panicking_handler).await;

    // Assert
    assert_eq!(code, 4);
    assert_eq!(out.contents(), "");
    assert_eq!(err.contents(), format!("Error: {UNEXPECTED_ERROR_MESSAGE}\n"));
    assert!(!err.contents().contains("exploded"), "panic text must not reach the user");
}

#[tokio::test]
async fn given_failing_handler_when_running_then_error_line_and_its_exit_code() {
    // Arrange
    let (_dir, ctx) = context(&[]);
    let (mut console, _out, err) = Console::captured();

    // Act
    let code = run_with(&ctx, &mut console, ["hello", "--name", "x"], failing_handler).await;

    // Assert
    assert_eq!(code, 4);
    let stderr = err.contents();
    assert_eq!(stderr.lines().count(), 1, "{stderr}");
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("temperature"), "{stderr}");
}

#[tokio::test]
async fn given_invalid_arguments_when_running_then_handler_is_not_invoked() {
    // Arrange
    let (_dir, ctx) = context(&[]);
    let (mut console, out, err) = Console::captured();

    // Act
    let code = run_with(&ctx, &mut console, ["hello"], counting_handler).await;

    // Assert
    assert_eq!(code, CliError::InvalidArgs(String::new()).exit_code());
    assert_eq!(out.contents(), "");
    assert!(err.contents().starts_with("Error: "));
}

#[tokio::test]
async fn given_handler_rejecting_arguments_when_running_then_reported_like_parse_failure() {
    // Arrange
    let (_dir, ctx) = context(&[]);
    let (mut console, out, err) = Console::captured();

    // Act
    let code = run_with(&ctx, &mut console, ["hello", "--name", "x"], rejecting_handler).await;

    // Assert
    assert_eq!(code, 2);
    assert_eq!(out.contents(), "");
    assert_eq!(err.contents(), "Error: --name is reserved\n");
}

#[tokio::test]
async fn given_version_and_help_markers_when_running_then_handler_is_not_invoked() {
    // Arrange
    let (_dir, ctx) = context(&[]);

    for args in [&["hello", "--name", "x", "-v"][..], &["hello", "-?"][..]] {
        let (mut console, out, _err) = Console::captured();

        // Act
        let code = run_with(&ctx, &mut console, args.iter().copied(), counting_handler).await;

        // Assert
        assert_eq!(code, 0);
        assert!(!out.contents().contains("handled"), "{args:?}");
    }
}

#[tokio::test]
async fn given_valid_command_when_running_with_handler_then_it_runs_once() {
    // Arrange
    let (_dir, ctx) = context(&[]);
    let (mut console, out, _err) = Console::captured();

    // Act
    let code = run_with(&ctx, &mut console, ["config", "show"], counting_handler).await;

    // Assert
    assert_eq!(code, 0);
    assert_eq!(out.contents(), "handled\n");
}

#[tokio::test]
async fn given_invalid_coordinates_when_running_weather_then_exit_two_without_network() {
    // Arrange
    let (_dir, ctx) = context(&[("Endpoints__OpenMeteo", "http://127.0.0.1:9")]);
    let (mut console, _out, err) = Console::captured();

    // Act
    let code = run(&ctx, &mut console, ["weather", "--lat", "91", "--lon", "0"]).await;

    // Assert
    assert_eq!(code, 2);
    assert!(err.contents().contains("between -90 and 90"), "{}", err.contents());
}

#[tokio::test]
async fn given_frozen_snapshot_when_running_config_show_then_prints_snapshot() {
    // Arrange
    let (dir, ctx) = context(&[]);
    std::fs::write(dir.path().join("appsettings.json"), r#"{ "HttpTimeoutSeconds": 11 }"#).unwrap();
    let first = ctx.config().clone();
    std::fs::write(dir.path().join("appsettings.json"), r#"{ "HttpTimeoutSeconds": 12 }"#).unwrap();
    let (mut console, out, _err) = Console::captured();

    // Act
    let code = run(&ctx, &mut console, ["config", "show"]).await;

    // Assert
    assert_eq!(code, 0);
    assert_eq!(first.http_timeout_seconds, 11);
    assert!(out.contents().contains("HttpTimeoutSeconds = 11"), "{}", out.contents());
}
