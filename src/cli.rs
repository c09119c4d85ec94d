use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapter::ScriptEngine;
use crate::bridge::Bridge;
use crate::config::{Config, LoggingConfig};
use crate::error::BridgeError;
use crate::runtime::ScriptRuntime;

/// Methods called when `run` is given none
pub const DEFAULT_SYNC_METHOD: &str = "test";
pub const DEFAULT_ASYNC_METHOD: &str = "testAsync";

/// Exit code for a script that failed to evaluate
pub const EXIT_EVALUATION: u8 = 2;
/// Exit code for an asynchronous call that settled with a failure
pub const EXIT_ASYNC: u8 = 3;
pub const EXIT_OTHER: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "script-bridge")]
#[command(about = "Call script controller methods from the host async runtime", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a script and call methods on the controller it produces
    Run {
        /// Script file evaluating to a controller object
        script: PathBuf,

        /// Method to call synchronously (repeatable)
        #[arg(long = "sync", value_name = "METHOD")]
        sync_methods: Vec<String>,

        /// Method to call and await (repeatable)
        #[arg(long = "async", value_name = "METHOD")]
        async_methods: Vec<String>,
    },

    /// Evaluate a script and check that it produces a controller
    Check {
        /// Script file to check
        script: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    run_cli_with_args(cli).await
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<BridgeError>() {
        Some(BridgeError::ScriptEvaluation { .. }) => EXIT_EVALUATION,
        Some(bridge) if bridge.is_async_failure() => EXIT_ASYNC,
        _ => EXIT_OTHER,
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over the configured filter
pub fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    // a subscriber may already be installed (tests, embedders)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load and validate configuration before executing any command
    let config = Config::builder()
        .config_path(cli.config.clone())
        .build()
        .context("failed to load configuration")?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Run {
            script,
            sync_methods,
            async_methods,
        } => {
            let (sync_methods, async_methods) =
                if sync_methods.is_empty() && async_methods.is_empty() {
                    (
                        vec![DEFAULT_SYNC_METHOD.to_string()],
                        vec![DEFAULT_ASYNC_METHOD.to_string()],
                    )
                } else {
                    (sync_methods, async_methods)
                };
            run_script(&script, config, &sync_methods, &async_methods).await?;
        }

        Commands::Check { script } => {
            let source = read_script(&script)?;
            let runtime = ScriptRuntime::interpreter(config)?;
            Bridge::new(&runtime, &source)?;
            println!("✓ {} produces a controller", script.display());
        }

        Commands::Config => {
            let rendered = config
                .to_toml()
                .context("failed to render configuration")?;
            print!("{}", rendered);
        }
    }

    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn run_script(
    script: &Path,
    config: Config,
    sync_methods: &[String],
    async_methods: &[String],
) -> Result<()> {
    let source = read_script(script)?;
    let runtime = ScriptRuntime::interpreter(config)?;
    let bridge = Bridge::new(&runtime, &source)?;

    for method in sync_methods {
        let result = bridge.call(method, Vec::new())?;
        let shown = runtime.with_engine(|engine| engine.display(&result));
        info!(method = %method, result = %shown, "sync call returned");
    }

    for method in async_methods {
        let result = bridge.call_async(method, Vec::new())?.await?;
        let shown = runtime.with_engine(|engine| engine.display(&result));
        info!(method = %method, result = %shown, "async call settled");
    }

    Ok(())
}
