//! replkit configuration
//!
//! User-level settings for the `replkit` binary.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. User-level (~/.config/replkit/config.toml)
//! 3. Default values
//! ```
//!
//! # Example
//!
//! ```toml
//! [repl]
//! prompt = "js> "
//! history_size = 500
//! history_file = "/home/me/.replkit_history"
//! use_colors = false
//! ignore_undefined = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repl::{ReplOptions, DEFAULT_PROMPT};

/// User-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserConfig {
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
}

/// REPL configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplConfig {
    /// Prompt string
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// Force colors on or off; detected from the terminal when unset
    #[serde(default)]
    pub use_colors: Option<bool>,
    /// Do not print `undefined` results
    #[serde(default)]
    pub ignore_undefined: bool,
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_history_size() -> usize {
    1000
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            history_size: default_history_size(),
            history_file: None,
            use_colors: None,
            ignore_undefined: false,
        }
    }
}

impl ReplConfig {
    /// Session options carrying these settings
    pub fn to_options(&self) -> ReplOptions {
        ReplOptions {
            history_size: Some(self.history_size),
            history_file: self.history_file.clone(),
            use_colors: self.use_colors,
            ignore_undefined: self.ignore_undefined,
            ..ReplOptions::new().with_prompt(self.prompt.clone())
        }
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("replkit"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("replkit"));
    }

    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("replkit"));
    }

    None
}

/// Get the user config file path (~/.config/replkit/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match get_config_path() {
        Some(path) => load_from_path(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load configuration from `path`, defaults when the file is missing
pub fn load_from_path(path: &Path) -> Result<UserConfig, ConfigError> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}
