//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashMap;

use fancy_regex::Regex;

use crate::channel::ChannelType;
use crate::common::error::ConfigError;
use crate::config::types::Config;
use crate::render::Format;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if matches!(
        config.default_channel,
        ChannelType::Private | ChannelType::Join | ChannelType::Leave | ChannelType::Switch
    ) {
        errors.push(format!(
            "default-channel '{}' cannot carry chat messages",
            config.default_channel
        ));
    }

    let modules = &config.modules;

    if modules.anti_duplication.enabled {
        if modules.anti_duplication.check_past_messages == 0 {
            errors.push("modules.anti-duplication.check-past-messages must be non-zero".to_string());
        }
        if modules.anti_duplication.expire_after == 0 {
            errors.push("modules.anti-duplication.expire-after must be non-zero".to_string());
        }
    }

    if modules.anti_spam.enabled && modules.anti_spam.messages_per_minute == 0 {
        errors.push("modules.anti-spam.messages-per-minute must be non-zero".to_string());
    }

    for (i, pattern) in modules.filter.patterns.iter().enumerate() {
        if Regex::new(pattern).is_err() {
            errors.push(format!(
                "modules.filter.patterns[{}] is not a valid regex: '{}'",
                i, pattern
            ));
        }
    }

    for name in modules.emoji.custom.keys() {
        if name.is_empty() || name.contains(':') || name.contains(char::is_whitespace) {
            errors.push(format!("modules.emoji.custom key '{}' is not a valid shortcode", name));
        }
    }

    if modules.multicast_chat.enabled {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, group) in modules.multicast_chat.server_groups.iter().enumerate() {
            if group.len() < 2 {
                errors.push(format!(
                    "modules.multicast-chat.server-groups[{}] needs at least two servers",
                    i
                ));
            }
            for server in group {
                if let Some(first) = seen.insert(server.as_str(), i) {
                    if first != i {
                        errors.push(format!(
                            "server '{}' is in multicast groups {} and {}",
                            server, first, i
                        ));
                    }
                }
            }
        }
    }

    let server_list = &modules.global_chat.server_list;
    if modules.global_chat.enabled && server_list.enabled && server_list.list.is_empty() {
        errors.push("modules.global-chat.server-list is enabled but empty".to_string());
    }

    for format in Format::ALL {
        let template = config.formats.get(format);
        if format.carries_message() && !template.contains("%message") {
            errors.push(format!("formats.{} must contain %message", format.key()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
