//! Tiered configuration loading.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "TASKHUB_CONFIG_PATH";
pub const ENV_DB_PATH: &str = "TASKHUB_DB_PATH";
pub const ENV_HOST: &str = "TASKHUB_HOST";
pub const ENV_PORT: &str = "TASKHUB_PORT";
pub const ENV_USER_DIR: &str = "TASKHUB_USER_DIR";
pub const ENV_PROJECT_DIR: &str = "TASKHUB_PROJECT_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults,
    Project,
    User,
    Environment,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// `./taskhub` unless overridden.
    pub project_dir: Option<PathBuf>,
    /// `~/.taskhub` unless overridden.
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover() -> Self {
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("taskhub")));
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".taskhub")));
        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Read one tier's YAML file. Missing files are skipped; unreadable or
/// malformed ones are skipped with a warning.
fn read_tier(dir: Option<&Path>, tier: ConfigTier) -> Option<(Value, PathBuf)> {
    let file = dir?.join(CONFIG_FILE);
    if !file.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(&file)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_yaml::from_str::<Value>(&content).map_err(Into::into));
    match parsed {
        Ok(value) => {
            debug!(tier = %tier, path = %file.display(), "loaded config tier");
            Some((value, file))
        }
        Err(e) => {
            warn!(tier = %tier, path = %file.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

/// Loads and merges configuration tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load with explicit directories and an environment lookup.
    ///
    /// An explicit config path replaces the file tiers; environment overrides
    /// still apply on top.
    pub fn load_with(paths: ConfigPaths, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let (mut config, config_path) = match env(ENV_CONFIG_PATH) {
            Some(explicit) => {
                let path = PathBuf::from(explicit);
                (Config::load(&path)?, Some(path))
            }
            None => {
                let mut tiers = vec![serde_json::to_value(Config::default())?];
                let mut config_path = None;
                for (dir, tier) in [
                    (paths.project_dir.as_deref(), ConfigTier::Project),
                    (paths.user_dir.as_deref(), ConfigTier::User),
                ] {
                    if let Some((value, file)) = read_tier(dir, tier) {
                        tiers.push(value);
                        config_path = Some(file);
                    }
                }
                let merged = deep_merge_all(tiers);
                let config: Config =
                    serde_json::from_value(merged).context("invalid merged configuration")?;
                (config, config_path)
            }
        };

        Self::apply_env_overrides(&mut config, &env)?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    fn apply_env_overrides(config: &mut Config, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = env(ENV_DB_PATH) {
            config.database.path = PathBuf::from(path);
        }
        if let Some(host) = env(ENV_HOST) {
            config.server.host = host;
        }
        if let Some(port) = env(ENV_PORT) {
            config.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, port))?;
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
