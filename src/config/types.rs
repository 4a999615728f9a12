use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::discovery::session::{DiscoveryOptions, RedirectMode};

pub const CONFIG_ENV_VAR: &str = "OCSTATUS_CONFIG";

/// Highest hop bound accepted by `Config::check`
pub const MAX_REDIRECT_HOPS_LIMIT: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,
    #[error("Config read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Contents of `~/.ocstatus/config.toml`
///
/// Probe timeouts are fixed and deliberately absent here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub redirect_mode: RedirectMode,
    pub max_redirect_hops: u32,
    pub user_agent: String,
    pub output: OutputFormat,
}

impl Config {
    /// Config file location, `OCSTATUS_CONFIG` takes precedence
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(home.join(".ocstatus").join("config.toml"))
    }

    /// Load config; a missing file yields defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write the default config if none exists yet, returning its path
    pub fn init() -> Result<PathBuf, ConfigError> {
        let path = Self::path()?;
        Self::init_at(&path)?;
        Ok(path)
    }

    pub fn init_at(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::default().save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_redirect_hops == 0 || self.max_redirect_hops > MAX_REDIRECT_HOPS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_redirect_hops must be between 1 and {}, got {}",
                MAX_REDIRECT_HOPS_LIMIT, self.max_redirect_hops
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn print(&self) -> Result<(), ConfigError> {
        println!("{}", toml::to_string_pretty(self)?);
        Ok(())
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            redirect_mode: self.redirect_mode,
            max_redirect_hops: self.max_redirect_hops,
        }
    }
}
