//! Configuration parsing (HOCON format).
//!
//! Errors name the origin of the input, either the file path or `<string>`.

use std::fs;
use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::types::Config;
use hocon::HoconLoader;

const STRING_ORIGIN: &str = "<string>";

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, &path.display().to_string())
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    parse(content, STRING_ORIGIN)
}

fn parse(content: &str, origin: &str) -> Result<Config, ConfigError> {
    let parse_error = |e: hocon::Error| ConfigError::ParseError {
        message: format!("{}: {}", origin, e),
    };

    HoconLoader::new()
        .load_str(content)
        .map_err(parse_error)?
        .resolve()
        .map_err(parse_error)
}
