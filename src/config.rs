//! Configuration file handling for Cost Guard.
//!
//! The configuration file is stored at `$COSTGUARD_HOME/config.json` and
//! contains settings for the application including the upstream cost API URL,
//! the server bind address and the defaults used by the analysis commands.

use crate::model::Window;
use crate::movers::DEFAULT_LIMIT;
use crate::seed::DEFAULT_SEED;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "costguard";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$COSTGUARD_HOME` and from there it
/// loads `$COSTGUARD_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory and an initial `config.json` with default
    /// settings (plus `upstream_url`, when given).
    ///
    /// # Errors
    /// Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, upstream_url: Option<&str>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the costguard home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = ConfigFile {
            upstream_url: upstream_url.map(str::to_string),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// Validates that the home directory and config file exist, then loads the
    /// configuration.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Costguard home is missing, run 'costguard init' first")?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Base URL of the upstream cost API, when one is configured.
    pub fn upstream_url(&self) -> Option<&str> {
        self.config_file.upstream_url.as_deref()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config_file.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> &str {
        &self.config_file.bind_addr
    }

    pub fn default_window(&self) -> Window {
        self.config_file.default_window
    }

    pub fn mover_limit(&self) -> usize {
        self.config_file.mover_limit
    }

    pub fn demo_seed(&self) -> u64 {
        self.config_file.demo_seed
    }
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "costguard",
///   "config_version": 1,
///   "upstream_url": "https://cost-api.internal.example.com",
///   "request_timeout_secs": 10,
///   "bind_addr": "127.0.0.1:8787",
///   "default_window": "30d",
///   "mover_limit": 7,
///   "demo_seed": 42
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "costguard".
    app_name: String,

    /// Configuration file version.
    config_version: u8,

    /// Base URL of the upstream cost API. When absent the app serves the
    /// built-in demo dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    upstream_url: Option<String>,

    /// Timeout for upstream requests, in seconds.
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,

    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    bind_addr: String,

    /// Window used when a command or request does not specify one.
    #[serde(default)]
    default_window: Window,

    /// Maximum number of top movers returned by default.
    #[serde(default = "default_mover_limit")]
    mover_limit: usize,

    /// RNG seed for the demo dataset.
    #[serde(default = "default_demo_seed")]
    demo_seed: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_mover_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_demo_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            upstream_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            default_window: Window::default(),
            mover_limit: DEFAULT_LIMIT,
            demo_seed: DEFAULT_SEED,
        }
    }
}

impl ConfigFile {
    /// Loads a `ConfigFile` from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it was not
    /// written by this application.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.mover_limit > 0,
            "mover_limit must be a positive integer"
        );
        Ok(config)
    }

    /// Saves the `ConfigFile` to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
