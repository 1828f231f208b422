//! Shared configuration for the adscope console.
//!
//! A TOML file in the platform config directory, layered over built-in
//! defaults and `ADSCOPE_` environment variables, and translated into
//! the `ConsoleSettings` and `SchemaConfig` values `adscope_core` takes
//! at construction. Core never reads this file itself.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adscope_core::{ConsoleSettings, SchemaConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

const OUTPUT_FORMATS: [&str; 5] = ["table", "json", "json-compact", "yaml", "plain"];
const COLOR_MODES: [&str; 3] = ["auto", "always", "never"];

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Directory snapshot opened when `--directory` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,

    /// View toggles handed to the console.
    #[serde(default)]
    pub console: ConsoleSettings,

    /// Columns, formatters, and class tables. Omitted keys keep the
    /// Active Directory defaults.
    #[serde(default)]
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    pub fn console_settings(&self) -> ConsoleSettings {
        self.console
    }

    pub fn schema_config(&self) -> SchemaConfig {
        self.schema.clone()
    }

    /// Reject values the console cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!(
                    "expected one of {}, got '{}'",
                    OUTPUT_FORMATS.join(", "),
                    self.defaults.output
                ),
            });
        }
        if !COLOR_MODES.contains(&self.defaults.color.as_str()) {
            return Err(ConfigError::Validation {
                field: "defaults.color".into(),
                reason: format!(
                    "expected one of {}, got '{}'",
                    COLOR_MODES.join(", "),
                    self.defaults.color
                ),
            });
        }
        if self.schema.columns.is_empty() {
            return Err(ConfigError::Validation {
                field: "schema.columns".into(),
                reason: "at least one column is required".into(),
            });
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "adscope", "adscope").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("adscope");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ADSCOPE_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
