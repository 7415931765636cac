//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `CHAT_RELAY_CONFIG` - Config file path
//! - `CHAT_RELAY_LOG_FILE` - Chat log file
//! - `CHAT_RELAY_DEFAULT_CHANNEL` - Fallback channel for messages

use std::env;

use tracing::warn;

use crate::channel::ChannelType;
use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CHAT_RELAY";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |name| env::var(name).ok())
}

fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(file) = lookup(&format!("{}_LOG_FILE", ENV_PREFIX)) {
        config.chat_log.file = if file.is_empty() { None } else { Some(file) };
    }

    if let Some(channel) = lookup(&format!("{}_DEFAULT_CHANNEL", ENV_PREFIX)) {
        match channel.parse::<ChannelType>() {
            Ok(channel) => config.default_channel = channel,
            Err(e) => warn!("Ignoring {}_DEFAULT_CHANNEL: {}", ENV_PREFIX, e),
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `CHAT_RELAY_CONFIG` environment variable, otherwise returns "chat-relay.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "chat-relay.conf".to_string())
}
