//! Configuration for script-bridge
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults
//! 2. a TOML file: the explicit path if one was given (must exist), otherwise
//!    `bridge.toml` in the working directory if present
//! 3. environment variables `BRIDGE_<SECTION>__<KEY>`, e.g.
//!    `BRIDGE_PUMP__MAX_CONSECUTIVE_DRAIN_FAILURES=0`
//!
//! A `.env` file is loaded into the environment first.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "BRIDGE";
const DEFAULT_CONFIG_FILE: &str = "bridge";

/* ===================== Sections ===================== */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pump: PumpConfig,
    pub timers: TimerConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Promise pump tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Consecutive failed drains before the call fails; 0 retries forever
    pub max_consecutive_drain_failures: u32,
    /// Pause between polls in milliseconds; 0 yields to the scheduler instead
    pub poll_interval_ms: u64,
    /// Give up on a pending call after this many milliseconds; 0 waits forever
    pub timeout_ms: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            max_consecutive_drain_failures: 8,
            poll_interval_ms: 0,
            timeout_ms: 0,
        }
    }
}

/// What happens when a callback scheduled with `scheduleDelayed` throws
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeferredErrorPolicy {
    /// Report through tracing and carry on
    #[default]
    Log,
    /// Panic the timer task, surfacing on tokio's unhandled-task path
    Propagate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub deferred_error_policy: DeferredErrorPolicy,
}

/// Settings for the built-in interpreter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nested calls allowed before a RangeError is thrown
    pub max_call_depth: usize,

    /// Native stack a single entry into the engine may grow by before nested
    /// calls throw a RangeError; keeps deep recursion inside a 2 MiB thread stack
    pub max_stack_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            max_stack_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing-subscriber filter directive; `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/* ===================== Loading ===================== */

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::builder().build()
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    log_filter: Option<String>,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Explicit config file (overrides default search)
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Logging filter (overrides config file and env vars)
    pub fn log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    /// Ignore `.env` and `BRIDGE_*` variables
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn build(self) -> Result<Config, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = match &self.config_path {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        if !self.skip_env {
            dotenvy::dotenv().ok();
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut config: Config = builder.build()?.try_deserialize()?;

        if let Some(filter) = self.log_filter {
            config.logging.filter = filter;
        }

        Ok(config)
    }
}
