//! Configuration loading, validation, and management for suiforge.
//!
//! Loads configuration from `~/.suiforge/config.toml` (or `$SUIFORGE_CONFIG`)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum page size accepted by `suix_queryEvents`.
pub const MAX_BATCH_SIZE: usize = 50;

/// The root configuration structure.
///
/// Maps directly to `~/.suiforge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Networks to watch; one watcher task per enabled entry
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,

    /// Polling behaviour shared by every watcher
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// External `sui` toolchain settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Deployer identity
    #[serde(default)]
    pub deployer: DeployerConfig,

    /// Where records, dead letters and scratch packages live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Contract template selection
    #[serde(default)]
    pub template: TemplateConfig,
}

/// One watched network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network tag stamped on events and records (e.g. "testnet")
    pub name: String,

    /// Fullnode JSON-RPC endpoint
    pub rpc_url: String,

    /// Package that emits the creation event
    pub factory_package_id: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Module inside the factory package that defines the event
    #[serde(default = "default_event_module")]
    pub event_module: String,

    /// Event struct name
    #[serde(default = "default_event_struct")]
    pub event_struct: String,

    /// Sleep after a cycle that produced no new events
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Sleep after a failed cycle
    #[serde(default = "default_backoff")]
    pub error_backoff_secs: u64,

    /// Page size per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Bound on each RPC call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_event_module() -> String {
    "factory".into()
}
fn default_event_struct() -> String {
    "TokenCreationEvent".into()
}
fn default_poll_interval() -> u64 {
    5
}
fn default_backoff() -> u64 {
    5
}
fn default_batch_size() -> usize {
    20
}
fn default_request_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            event_module: default_event_module(),
            event_struct: default_event_struct(),
            poll_interval_secs: default_poll_interval(),
            error_backoff_secs: default_backoff(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl WatcherConfig {
    /// Fully qualified Move event type for a factory package.
    pub fn event_type(&self, factory_package_id: &str) -> String {
        format!(
            "{}::{}::{}",
            factory_package_id, self.event_module, self.event_struct
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Path or name of the `sui` binary
    #[serde(default = "default_sui_binary")]
    pub sui_binary: String,

    /// Gas budget (MIST) for publish and transfer transactions
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,

    #[serde(default = "default_build_timeout")]
    pub build_timeout_secs: u64,

    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,

    /// Git revision of the Sui framework pinned in generated `Move.toml`
    #[serde(default = "default_framework_rev")]
    pub framework_rev: String,

    /// Hand the treasury cap to the token creator after publishing
    #[serde(default)]
    pub transfer_capabilities: bool,
}

fn default_sui_binary() -> String {
    "sui".into()
}
fn default_gas_budget() -> u64 {
    100_000_000
}
fn default_build_timeout() -> u64 {
    60
}
fn default_publish_timeout() -> u64 {
    120
}
fn default_framework_rev() -> String {
    "framework/testnet".into()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            sui_binary: default_sui_binary(),
            gas_budget: default_gas_budget(),
            build_timeout_secs: default_build_timeout(),
            publish_timeout_secs: default_publish_timeout(),
            framework_rev: default_framework_rev(),
            transfer_capabilities: false,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Address recorded as the deployer of every package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Ed25519 secret key (hex) or a Sui keystore entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl std::fmt::Debug for DeployerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployerConfig")
            .field("address", &self.address)
            .field(
                "private_key",
                &match self.private_key {
                    Some(_) => "[REDACTED]",
                    None => "None",
                },
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Defaults to `<config dir>/data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Defaults to the system temp dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("data"))
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir().join("tokens.jsonl")
    }

    pub fn dead_letter_path(&self) -> PathBuf {
        self.data_dir().join("dead_letters.jsonl")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("suiforge"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Custom Move template; the built-in coin template is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from `$SUIFORGE_CONFIG` or `~/.suiforge/config.toml`.
    ///
    /// Environment overrides (highest priority):
    /// - `SUIFORGE_DEPLOYER_PRIVATE_KEY`
    /// - `SUIFORGE_DEPLOYER_ADDRESS`
    /// - `SUIFORGE_SUI_BIN`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("SUIFORGE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;

        if let Ok(key) = std::env::var("SUIFORGE_DEPLOYER_PRIVATE_KEY") {
            config.deployer.private_key = Some(key);
        }
        if let Ok(address) = std::env::var("SUIFORGE_DEPLOYER_ADDRESS") {
            config.deployer.address = Some(address);
        }
        if let Ok(bin) = std::env::var("SUIFORGE_SUI_BIN") {
            config.toolchain.sui_binary = bin;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".suiforge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for network in &self.networks {
            if network.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "network name must not be empty".into(),
                ));
            }
            if !names.insert(network.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "network '{}' is configured more than once",
                    network.name
                )));
            }
            if !network.rpc_url.starts_with("http://") && !network.rpc_url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "network '{}': rpc_url must be http(s), got '{}'",
                    network.name, network.rpc_url
                )));
            }
            if !network.factory_package_id.starts_with("0x") {
                return Err(ConfigError::ValidationError(format!(
                    "network '{}': factory_package_id must be a 0x-prefixed object id",
                    network.name
                )));
            }
        }

        if self.watcher.batch_size == 0 || self.watcher.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "watcher.batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }

        if self.watcher.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "watcher.request_timeout_secs must be > 0".into(),
            ));
        }

        if self.toolchain.gas_budget == 0 {
            return Err(ConfigError::ValidationError(
                "toolchain.gas_budget must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Networks with `enabled = true`.
    pub fn enabled_networks(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter().filter(|n| n.enabled)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self {
            networks: vec![NetworkConfig {
                name: "testnet".into(),
                rpc_url: "https://fullnode.testnet.sui.io:443".into(),
                factory_package_id: "0x0".into(),
                enabled: false,
            }],
            ..Self::default()
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
