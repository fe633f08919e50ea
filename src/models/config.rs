//! Configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the active plugin jars.
    pub plugins_dir: PathBuf,
    /// Name of the update-staging subdirectory inside the plugins directory.
    pub update_dir_name: String,
    /// Path of the plugin list file.
    pub list_file: PathBuf,
    /// Platform name used for Modrinth/Hangar loader filtering.
    pub platform: String,
    /// GitHub API token. Falls back to the GITHUB_TOKEN environment variable.
    pub github_token: Option<String>,
    /// Rollback configuration.
    pub rollback: RollbackConfig,
    /// Build fallback configuration.
    pub build: BuildConfig,
}

/// Rollback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    /// Whether automatic rollback is active.
    pub enabled: bool,
    /// Root directory for snapshots, failure archives and the pending queue.
    pub root: PathBuf,
    /// Failure-signature regular expressions matched against host log lines.
    /// Empty means use the built-in defaults.
    pub failure_patterns: Vec<String>,
    /// Maximum snapshots retained per plugin.
    pub max_snapshots: usize,
}

/// Build fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Wall-clock limit for one build tool invocation, in seconds.
    pub timeout_secs: u64,
    /// Seconds between JitPack build-status polls.
    pub poll_interval_secs: u64,
    /// Maximum JitPack status polls before giving up.
    pub max_polls: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from("plugins"),
            update_dir_name: "update".to_string(),
            list_file: PathBuf::from("plugins/update-list.txt"),
            platform: "paper".to_string(),
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            rollback: RollbackConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: PathBuf::from("plugins/.rollback"),
            failure_patterns: Vec::new(),
            max_snapshots: 3,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            poll_interval_secs: 10,
            max_polls: 30,
        }
    }
}

impl Config {
    /// Staging directory for updates of already-loaded jars.
    pub fn update_dir(&self) -> PathBuf {
        self.plugins_dir.join(&self.update_dir_name)
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plugin_updater")
}

/// Load configuration from file.
pub fn load_config() -> Config {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str(&content) {
                return config;
            }
        }
    }

    Config::default()
}
