//! CLI argument parsing and exit codes

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::NamedTempFile;

use script_bridge::cli::{self, Cli, Commands, EXIT_ASYNC, EXIT_EVALUATION, EXIT_OTHER};

fn script_file(source: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".js")
        .tempfile()
        .expect("Failed to create temp script");
    file.write_all(source.as_bytes()).expect("Failed to write script");
    file
}

fn path_arg(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

async fn run(args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["script-bridge"];
    argv.extend_from_slice(args);
    cli::run_cli_from_args(argv).await
}

#[test]
fn test_parse_run_with_methods() {
    let cli = Cli::try_parse_from([
        "script-bridge",
        "--config",
        "bridge.toml",
        "run",
        "app.js",
        "--sync",
        "a",
        "--sync",
        "b",
        "--async",
        "c",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("bridge.toml")));
    match cli.command {
        Commands::Run {
            script,
            sync_methods,
            async_methods,
        } => {
            assert_eq!(script, PathBuf::from("app.js"));
            assert_eq!(sync_methods, vec!["a", "b"]);
            assert_eq!(async_methods, vec!["c"]);
        }
        other => panic!("Expected Run, got {:?}", other),
    }
}

#[test]
fn test_parse_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["script-bridge", "check", "app.js", "--config", "x.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    assert!(matches!(cli.command, Commands::Check { .. }));
}

#[test]
fn test_parse_requires_script() {
    assert!(Cli::try_parse_from(["script-bridge", "run"]).is_err());
}

#[tokio::test]
async fn test_run_success() {
    let file = script_file(
        r#"({
            test() { log('sync ok'); },
            async testAsync() { await sleep(5); log('async ok'); }
        })"#,
    );
    run(&["run", &path_arg(&file)]).await.unwrap();
}

#[tokio::test]
async fn test_unparsable_script_exits_with_evaluation_code() {
    let file = script_file("class {");
    let err = run(&["run", &path_arg(&file)]).await.unwrap_err();
    assert_eq!(cli::exit_code(&err), EXIT_EVALUATION);

    let err = run(&["check", &path_arg(&file)]).await.unwrap_err();
    assert_eq!(cli::exit_code(&err), EXIT_EVALUATION);
}

#[tokio::test]
async fn test_rejecting_async_method_exits_with_async_code() {
    let file = script_file("({ async explode() { await sleep(1); throw new Error('no'); } })");
    let err = run(&["run", &path_arg(&file), "--async", "explode"])
        .await
        .unwrap_err();
    assert_eq!(cli::exit_code(&err), EXIT_ASYNC);
}

#[tokio::test]
async fn test_missing_method_exits_with_other_code() {
    let file = script_file("({})");
    let err = run(&["run", &path_arg(&file), "--sync", "absent"])
        .await
        .unwrap_err();
    assert_eq!(cli::exit_code(&err), EXIT_OTHER);
}

#[tokio::test]
async fn test_missing_script_file_exits_with_other_code() {
    let err = run(&["run", "/definitely/not/here.js"]).await.unwrap_err();
    assert_eq!(cli::exit_code(&err), EXIT_OTHER);
    assert!(format!("{:#}", err).contains("failed to read"));
}

#[tokio::test]
async fn test_check_sample_script() {
    let sample = concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/test.js");
    run(&["check", sample]).await.unwrap();
}

#[tokio::test]
async fn test_sample_script_sync_method() {
    let sample = concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/test.js");
    run(&["run", sample, "--sync", "test"]).await.unwrap();
}

#[tokio::test]
async fn test_config_command_with_explicit_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[pump]\ntimeout_ms = 1000").unwrap();
    run(&["--config", &path_arg(&file), "config"]).await.unwrap();

    let err = run(&["--config", "/definitely/not/here.toml", "config"])
        .await
        .unwrap_err();
    assert_eq!(cli::exit_code(&err), EXIT_OTHER);
}
