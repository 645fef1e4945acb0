//! End-to-end tests of the `archetype` binary.
//!
//! Every invocation runs with the ambient configuration variables removed
//! and `ARCHETYPE_CONFIG_DIR` pointing at a throwaway directory, so the host
//! environment cannot leak into the result.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use archetype::util::testing::{ambient_variables, settings_dir};

const FORECAST_BODY: &str = r#"{
    "latitude": 52.52,
    "longitude": 13.41,
    "current_weather": {
        "temperature": 12.3,
        "windspeed": 5.0,
        "winddirection": 225.0,
        "weathercode": 3,
        "time": "2024-05-01T12:00"
    }
}"#;

fn archetype(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("archetype").expect("binary built");
    for name in ambient_variables() {
        cmd.env_remove(name);
    }
    cmd.env_remove("RUST_LOG")
        .env("ARCHETYPE_CONFIG_DIR", dir.path())
        .env("NO_COLOR", "1");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("binary runs");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================
// Help and version
// ============================================================

#[test]
fn given_no_arguments_when_running_then_prints_root_help() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act
    let bare = stdout_of(&mut archetype(&dir));
    let explicit = stdout_of(archetype(&dir).arg("--help"));

    // Assert
    assert_eq!(bare, explicit);
    assert!(bare.contains("Usage: archetype"), "{bare}");
    archetype(&dir).assert().success();
}

#[test]
fn given_version_flag_when_running_then_prints_package_version() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    for flag in ["-v", "--version"] {
        archetype(&dir)
            .arg(flag)
            .assert()
            .success()
            .stdout(format!("{}\n", env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn given_help_and_version_when_running_then_help_wins() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["--help", "--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: archetype"));
}

#[test]
fn given_subcommand_help_when_running_then_prints_its_usage() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["hello", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("archetype hello").and(predicate::str::contains("--name")));
}

#[test]
fn given_invalid_arguments_and_help_when_running_then_help_is_still_honoured() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["hello", "--bogus", "-h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("archetype hello"));
}

// ============================================================
// hello
// ============================================================

#[test]
fn given_name_when_greeting_then_prints_greeting() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["hello", "--name", "Ada"])
        .assert()
        .success()
        .stdout("Hello, Ada!\n")
        .stderr(predicate::str::contains("Error").not());
}

#[test]
fn given_missing_name_when_greeting_then_exits_with_validation_error() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .arg("hello")
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::starts_with("Error: ").and(predicate::str::contains("--name")));
}

#[test]
fn given_blank_name_when_greeting_then_exits_with_validation_error() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["hello", "--name", "   "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--name must be a non-empty value"));
}

#[test]
fn given_unknown_command_when_running_then_exits_with_validation_error() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .arg("frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized command 'frobnicate'"));
}

// ============================================================
// config
// ============================================================

#[test]
fn given_settings_file_when_showing_config_then_prints_resolved_values() {
    // Arrange
    let dir = settings_dir(&[(
        "appsettings.json",
        r#"{ "App": { "HttpTimeoutSeconds": 100, "LogLevel": "warning" } }"#,
    )]);

    // Act & Assert
    archetype(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("HttpTimeoutSeconds = 100")
                .and(predicate::str::contains("LogLevel = \"Warning\""))
                .and(predicate::str::contains("Environment = \"Production\"")),
        );
}

#[test]
fn given_out_of_range_timeout_when_showing_config_then_default_is_printed() {
    // Arrange
    let dir = settings_dir(&[("appsettings.toml", "HttpTimeoutSeconds = 0\n")]);

    // Act & Assert
    archetype(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HttpTimeoutSeconds = 30"));
}

#[test]
fn given_environment_variable_when_showing_config_then_it_overrides_files() {
    // Arrange
    let dir = settings_dir(&[("appsettings.json", r#"{ "HttpTimeoutSeconds": 10 }"#)]);

    // Act & Assert
    archetype(&dir)
        .args(["config", "show"])
        .env("App__HttpTimeoutSeconds", "45")
        .assert()
        .success()
        .stdout(predicate::str::contains("HttpTimeoutSeconds = 45"));
}

#[test]
fn given_environment_name_when_printing_config_path_then_lists_candidates() {
    // Arrange
    let dir = settings_dir(&[("appsettings.json", "{}")]);

    // Act
    let stdout = stdout_of(
        archetype(&dir)
            .args(["config", "path"])
            .env("ARCHETYPE_ENVIRONMENT", "Development"),
    );

    // Assert
    assert!(stdout.contains(&format!("Config directory: {}", dir.path().display())), "{stdout}");
    assert!(stdout.contains("Environment: Development"), "{stdout}");
    assert!(stdout.contains("appsettings.json (found)"), "{stdout}");
    assert!(stdout.contains("appsettings.Development.toml (missing)"), "{stdout}");
}

#[test]
fn given_config_without_subcommand_when_running_then_exits_with_validation_error() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'config' requires a subcommand"));
}

#[test]
fn given_invalid_endpoint_when_running_then_warning_reaches_stderr() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["hello", "-n", "x"])
        .env("Endpoints__GeoIp", "ftp://x")
        .assert()
        .success()
        .stdout("Hello, x!\n")
        .stderr(
            predicate::str::contains("WARN")
                .and(predicate::str::contains("Endpoints.GeoIp"))
                .and(predicate::str::contains("using default endpoints")),
        );
}

// ============================================================
// weather
// ============================================================

#[test]
fn given_latitude_without_longitude_when_running_weather_then_exits_with_validation_error() {
    // Arrange
    let dir = settings_dir(&[]);

    // Act & Assert
    archetype(&dir)
        .args(["weather", "--lat", "52.5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--lon"));
}

#[tokio::test(flavor = "multi_thread")]
async fn given_coordinates_when_running_weather_then_prints_report() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("current_weather", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FORECAST_BODY))
        .mount(&server)
        .await;
    let dir = settings_dir(&[]);
    let mut cmd = archetype(&dir);
    cmd.args(["weather", "--lat", "52.52", "--lon", "13.41"])
        .env("Endpoints__OpenMeteo", server.uri());

    // Act
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("join")
        .expect("binary runs");

    // Assert
    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Weather Report").and(predicate::str::contains("Overcast")));
}

#[tokio::test(flavor = "multi_thread")]
async fn given_server_error_when_running_weather_then_exits_with_server_code_and_correlation_id() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = settings_dir(&[]);
    let mut cmd = archetype(&dir);
    cmd.args(["weather", "--lat", "1", "--lon", "2"])
        .env("Endpoints__OpenMeteo", server.uri());

    // Act
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("join")
        .expect("binary runs");

    // Assert
    output
        .assert()
        .code(3)
        .stdout("")
        .stderr(predicate::str::contains("status 503").and(predicate::str::contains("(Correlation ID: ")));
}

#[tokio::test(flavor = "multi_thread")]
async fn given_geoip_failure_when_running_weather_then_exits_with_provider_message() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":"fail","message":"reserved range"}"#),
        )
        .mount(&server)
        .await;
    let dir = settings_dir(&[]);
    let mut cmd = archetype(&dir);
    cmd.arg("weather").env("Endpoints__GeoIp", server.uri());

    // Act
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("join")
        .expect("binary runs");

    // Assert
    output
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: reserved range"));
}
