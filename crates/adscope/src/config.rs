//! CLI configuration: thin wrapper around `adscope_config`.
//!
//! Adds `--config` awareness on top of the shared loader.

use std::path::PathBuf;

pub use adscope_config::{Config, load_config_from, save_config_to};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config` / `ADSCOPE_CONFIG`, else the
/// platform default.
pub fn path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(adscope_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&path(global))?)
}
