use crate::modal::{ModalPosition, ModalSize, ScrollLockPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "modalflow";
const ENV_PREFIX: &str = "MODALFLOW_";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory for the log file
    pub data_dir: PathBuf,

    pub modal: ModalConfig,

    pub guard: GuardConfig,

    pub ui: UiConfig,
}

/// Overlay behaviour
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModalConfig {
    /// How overlapping `prevent_scroll` modals share the page scroll lock
    pub scroll_lock: ScrollLockPolicy,

    /// Ticks a closed modal keeps fading before its exit completes
    pub exit_transition_ticks: u32,

    /// Size used by the demo dialogs
    pub default_size: ModalSize,

    pub default_position: ModalPosition,
}

/// Unsaved-changes guard
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Subtree whose screens are guarded
    pub base_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Tick interval in milliseconds
    pub tick_rate_ms: u64,

    pub mouse_enabled: bool,

    /// Show the key help overlay on start
    pub show_help: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("./data")),
            modal: ModalConfig::default(),
            guard: GuardConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            scroll_lock: ScrollLockPolicy::Counted,
            exit_transition_ticks: 2,
            default_size: ModalSize::Md,
            default_position: ModalPosition::Center,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_path: "/settings".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            mouse_enabled: true,
            show_help: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Initialize configuration from defaults, the config file and the environment
    ///
    /// An explicit `path` must exist. The default location is optional.
    pub async fn init(path: Option<&Path>) -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = match path {
            Some(path) => Self::load_from_file(path).await?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path).await?,
                _ => Self::default(),
            },
        };

        config.load_from_env()?;
        config.validate()?;

        if !config.data_dir.exists() {
            std::fs::create_dir_all(&config.data_dir)
                .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;
        }

        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/modalflow/config.json` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load overrides from `MODALFLOW_*` environment variables
    pub fn load_from_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(dir) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(policy) = var("SCROLL_LOCK") {
            self.modal.scroll_lock = match policy.to_ascii_lowercase().as_str() {
                "counted" => ScrollLockPolicy::Counted,
                "latched" => ScrollLockPolicy::Latched,
                _ => return Err(invalid_env("SCROLL_LOCK", policy)),
            };
        }

        if let Some(ticks) = var("EXIT_TICKS") {
            self.modal.exit_transition_ticks = ticks.parse().map_err(|_| invalid_env("EXIT_TICKS", ticks))?;
        }

        if let Some(base_path) = var("BASE_PATH") {
            self.guard.base_path = base_path;
        }

        if let Some(tick_rate) = var("TICK_MS") {
            self.ui.tick_rate_ms = tick_rate.parse().map_err(|_| invalid_env("TICK_MS", tick_rate))?;
        }

        if let Some(mouse) = var("MOUSE") {
            self.ui.mouse_enabled = matches!(mouse.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ui.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("ui.tick_rate_ms must be greater than zero".to_string()));
        }

        if !self.guard.base_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "guard.base_path must be absolute, got '{}'",
                self.guard.base_path
            )));
        }

        Ok(())
    }
}

fn invalid_env(name: &str, value: String) -> ConfigError {
    ConfigError::InvalidEnv {
        key: format!("{}{}", ENV_PREFIX, name),
        value,
    }
}
