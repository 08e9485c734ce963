//! Daemon configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `TRANSFLOW_*` environment variables (`__` separates sections).

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use transflow_api_rpc::RpcServerConfig;
use transflow_core::application::dispatcher::constants::*;
use transflow_core::application::DispatcherConfig;

pub const ENV_PREFIX: &str = "TRANSFLOW";
const CONFIG_PATH_VAR: &str = "TRANSFLOW_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "transflow";
const DEFAULT_DB_PATH: &str = "~/.transflow/translations.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageMode {
    /// Call the external service
    Remote,
    /// In-process implementation
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSection {
    pub host: String,
    pub port: u16,
}

impl Default for RpcSection {
    fn default() -> Self {
        let defaults = RpcServerConfig::default();
        Self {
            host: defaults.host,
            port: defaults.port,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: String,
    pub reset_on_start: bool,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.to_string(),
            reset_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSection {
    pub packet_size: usize,
    pub startup_delay_secs: u64,
    pub initial_time_remaining_secs: i64,
    pub worker_count: usize,
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            startup_delay_secs: DEFAULT_STARTUP_DELAY.as_secs(),
            initial_time_remaining_secs: DEFAULT_INITIAL_TIME_REMAINING_SECS,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub endpoint: String,
    pub api_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSection {
    pub mode: StageMode,
    pub url: String,
}

impl Default for TransformSection {
    fn default() -> Self {
        Self {
            mode: StageMode::Remote,
            url: "http://127.0.0.1:5001/process_xml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondarySection {
    pub url: String,
    pub method: String,
}

impl Default for SecondarySection {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5003".to_string(),
            method: "translation.retranslate.v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSinkSection {
    pub mode: StageMode,
    pub url: String,
}

impl Default for LogSinkSection {
    fn default() -> Self {
        Self {
            mode: StageMode::Remote,
            url: "http://127.0.0.1:5002/log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: LogFormat,
    /// Daily rolling log files are written here when set
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub rpc: RpcSection,
    pub store: StoreSection,
    pub dispatcher: DispatcherSection,
    pub provider: ProviderSection,
    pub transform: TransformSection,
    pub secondary: SecondarySection,
    pub log_sink: LogSinkSection,
    pub logging: LoggingSection,
}

impl DaemonConfig {
    /// Load from `.env`, `TRANSFLOW_CONFIG` (or `./transflow.toml`) and the environment
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let file = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
        Self::load_with(file, ENV_PREFIX)
    }

    /// Explicit file and environment prefix; a given file must exist
    pub fn load_with(file: Option<PathBuf>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Self::default()).context("Invalid default configuration")?,
        );

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: DaemonConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.endpoint.trim().is_empty() {
            bail!("provider.endpoint must be set");
        }
        if self.transform.mode == StageMode::Remote && self.transform.url.trim().is_empty() {
            bail!("transform.url must be set when transform.mode = remote");
        }
        if self.secondary.url.trim().is_empty() {
            bail!("secondary.url must be set");
        }
        if self.log_sink.mode == StageMode::Remote && self.log_sink.url.trim().is_empty() {
            bail!("log_sink.url must be set when log_sink.mode = remote");
        }
        self.dispatcher_config().validate()?;
        Ok(())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            packet_size: self.dispatcher.packet_size,
            startup_delay: Duration::from_secs(self.dispatcher.startup_delay_secs),
            initial_time_remaining_secs: self.dispatcher.initial_time_remaining_secs,
            worker_count: self.dispatcher.worker_count,
        }
    }

    pub fn rpc_server_config(&self) -> RpcServerConfig {
        RpcServerConfig {
            host: self.rpc.host.clone(),
            port: self.rpc.port,
        }
    }

    /// Database file with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.path).into_owned())
    }
}
