//! Settings for the lucidity binary.
//!
//! Built-in defaults are overlaid by a TOML file and then by `LUCIDITY_*`
//! environment variables.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use lucidity_core::DEFAULT_MIN_CODE_CHANGE_BYTES;
use lucidity_exec::{CommandConfig, DEFAULT_FETCH_TIMEOUT};
use lucidity_git::{CacheConfig, DEFAULT_CLEANUP_DAYS, DEFAULT_CLONE_TIMEOUT};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "lucidity.toml";

pub const ENV_CACHE_DIR: &str = "LUCIDITY_CACHE_DIR";
pub const ENV_CLONE_TIMEOUT: &str = "LUCIDITY_CLONE_TIMEOUT";
pub const ENV_FETCH_TIMEOUT: &str = "LUCIDITY_FETCH_TIMEOUT";
pub const ENV_CLEANUP_DAYS: &str = "LUCIDITY_CLEANUP_DAYS";
pub const ENV_SSH_VERIFY: &str = "LUCIDITY_SSH_VERIFY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root of the repository cache
    pub cache_dir: PathBuf,
    pub clone_timeout_secs: u64,
    /// Bound for fetch, pull and diff
    pub fetch_timeout_secs: u64,
    pub cleanup_days: u32,
    /// Verify SSH host keys when cloning
    pub ssh_verify: bool,
    pub min_code_change_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            cache_dir: cache.cache_dir,
            clone_timeout_secs: DEFAULT_CLONE_TIMEOUT.as_secs(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            cleanup_days: DEFAULT_CLEANUP_DAYS,
            ssh_verify: false,
            min_code_change_bytes: DEFAULT_MIN_CODE_CHANGE_BYTES,
        }
    }
}

impl Settings {
    /// Load settings from the first config file found, then the environment.
    ///
    /// An explicit `config_path` must exist. Otherwise `./lucidity.toml` and
    /// then `<config dir>/lucidity/lucidity.toml` are tried, and defaults are
    /// used when neither exists.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Self::from_file(path)?
            }
            None => match default_config_path() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Overlay values from `lookup`, which maps variable names to values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|d| !d.is_empty()) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_CLONE_TIMEOUT) {
            self.clone_timeout_secs = parse_number(ENV_CLONE_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_TIMEOUT) {
            self.fetch_timeout_secs = parse_number(ENV_FETCH_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_CLEANUP_DAYS) {
            self.cleanup_days = parse_number(ENV_CLEANUP_DAYS, &value)?;
        }
        if let Some(value) = lookup(ENV_SSH_VERIFY) {
            self.ssh_verify = matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes");
        }
        Ok(())
    }

    pub fn command_config(&self) -> CommandConfig {
        CommandConfig::new(Duration::from_secs(self.fetch_timeout_secs), self.ssh_verify)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache_dir.clone())
            .with_clone_timeout(Duration::from_secs(self.clone_timeout_secs))
            .with_cleanup_days(self.cleanup_days)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("lucidity").join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer, got {:?}", key, value))
}
