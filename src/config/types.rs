//! Configuration type definitions.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::channel::ChannelType;
use crate::render::{FormatSet, Notices};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Channel used when neither the message nor the sender picks one.
    #[serde(default = "default_channel", deserialize_with = "channel_from_str")]
    pub default_channel: ChannelType,
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub formats: FormatSet,
    #[serde(default)]
    pub messages: Notices,
    #[serde(default)]
    pub chat_log: ChatLogConfig,
}

fn default_channel() -> ChannelType {
    ChannelType::Local
}

/// Channel names are matched case-insensitively.
fn channel_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChannelType, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_channel: default_channel(),
            modules: ModulesConfig::default(),
            formats: FormatSet::default(),
            messages: Notices::default(),
            chat_log: ChatLogConfig::default(),
        }
    }
}

/// Per-module settings. Every module has an `enabled` flag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModulesConfig {
    pub anti_duplication: AntiDuplicationConfig,
    pub anti_spam: AntiSpamConfig,
    pub filter: FilterConfig,
    pub muting: ToggleConfig,
    pub emoji: EmojiConfig,
    pub spy: ToggleConfig,
    pub multicast_chat: MulticastChatConfig,
    pub global_chat: GlobalChatConfig,
    pub ignoring: ToggleConfig,
    pub messenger: MessengerConfig,
    pub chat_logging: ChatLoggingConfig,
}

/// A module with no settings besides being on or off.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToggleConfig {
    pub enabled: bool,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AntiDuplicationConfig {
    pub enabled: bool,
    /// How many recent messages per sender are compared.
    pub check_past_messages: usize,
    /// Seconds after which a remembered message no longer counts.
    pub expire_after: u64,
}

impl Default for AntiDuplicationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_past_messages: 3,
            expire_after: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AntiSpamConfig {
    pub enabled: bool,
    pub messages_per_minute: usize,
}

impl Default for AntiSpamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            messages_per_minute: 20,
        }
    }
}

/// Regex patterns that block a message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    pub enabled: bool,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EmojiConfig {
    pub enabled: bool,
    /// Extra shortcodes, name without colons to replacement.
    pub custom: HashMap<String, String>,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            custom: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MulticastChatConfig {
    pub enabled: bool,
    /// Servers whose local chat is shared. A server belongs to at most one group.
    pub server_groups: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalChatConfig {
    pub enabled: bool,
    pub server_list: ServerListConfig,
}

impl Default for GlobalChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server_list: ServerListConfig::default(),
        }
    }
}

/// Restricts global chat to the listed servers when enabled.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerListConfig {
    pub enabled: bool,
    pub list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MessengerConfig {
    /// Run private messages through the filter chains.
    pub filter_private_messages: bool,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            filter_private_messages: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChatLoggingConfig {
    pub enabled: bool,
    pub private_messages: bool,
}

impl Default for ChatLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            private_messages: true,
        }
    }
}

/// Where chat log lines go. Without a file they become tracing events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChatLogConfig {
    pub file: Option<String>,
}
