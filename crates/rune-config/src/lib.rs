//! Rune bidi configuration
//!
//! Engine defaults for `rune-bidi`, loaded from `rune.toml` with
//! environment variable overrides. Values are kept as plain strings and
//! validated by the engine when it is built from them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RuneConfig {
    /// Bidi engine defaults
    pub bidi: BidiConfig,
}

/// Bidi engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BidiConfig {
    /// `ltr`, `rtl`, `auto-ltr`, `auto-rtl` or an explicit level 0..=125
    pub paragraph_level: String,
    /// Reordering mode name, e.g. `default` or `inverse-like-direct`
    pub reordering_mode: String,
    /// Reordering option names (`insert-marks`, `remove-controls`, `streaming`)
    pub reordering_options: Vec<String>,
    /// Write option names (`do-mirroring`, `keep-base-combining`, ...)
    pub write_options: Vec<String>,
    /// Legacy inverse switch; when set it replaces `reordering_mode`
    pub inverse: bool,
    /// Give paragraph separators level 0 so paragraphs read left to right
    pub order_paragraphs_ltr: bool,
}

impl Default for BidiConfig {
    fn default() -> Self {
        Self {
            paragraph_level: "auto-ltr".to_string(),
            reordering_mode: "default".to_string(),
            reordering_options: Vec::new(),
            write_options: Vec::new(),
            inverse: false,
            order_paragraphs_ltr: false,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn env_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl RuneConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `rune.toml` in the current directory,
    /// or return the default configuration if it is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file("rune.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(level) = std::env::var("RUNE_BIDI_PARA_LEVEL") {
            self.bidi.paragraph_level = level;
        }
        if let Ok(mode) = std::env::var("RUNE_BIDI_MODE") {
            self.bidi.reordering_mode = mode;
        }
        if let Ok(val) = std::env::var("RUNE_BIDI_OPTIONS") {
            self.bidi.reordering_options = env_list(&val);
        }
        if let Ok(val) = std::env::var("RUNE_BIDI_WRITE_OPTIONS") {
            self.bidi.write_options = env_list(&val);
        }
        if let Ok(val) = std::env::var("RUNE_BIDI_INVERSE") {
            self.bidi.inverse = env_flag(&val);
        }
        if let Ok(val) = std::env::var("RUNE_BIDI_ORDER_PARAGRAPHS_LTR") {
            self.bidi.order_paragraphs_ltr = env_flag(&val);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
