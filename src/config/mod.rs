//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use env::{apply_env_overrides, get_config_path};
pub use parser::{load_config, load_config_str};
pub use types::*;
pub use validate::validate_config;

use std::path::Path;

use crate::common::ConfigError;

/// Load a config file, apply environment overrides and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = apply_env_overrides(load_config(path)?);
    validate_config(&config)?;
    Ok(config)
}
