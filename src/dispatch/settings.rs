//! Dispatcher settings derived from configuration.

use crate::channel::ChannelType;
use crate::common::ServerName;
use crate::config::Config;
use crate::render::{FormatSet, Notices};
use crate::routing::ServerGroups;

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub default_channel: ChannelType,
    pub formats: FormatSet,
    pub notices: Notices,
    /// Servers allowed to see global chat, when restricted.
    pub global_server_list: Option<Vec<ServerName>>,
    pub multicast_groups: ServerGroups,
    pub filter_private_messages: bool,
    pub log_private_messages: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RelaySettings {
    fn from(config: &Config) -> Self {
        let modules = &config.modules;
        let server_list = &modules.global_chat.server_list;
        Self {
            default_channel: config.default_channel,
            formats: config.formats.clone(),
            notices: config.messages.clone(),
            global_server_list: server_list.enabled.then(|| {
                server_list
                    .list
                    .iter()
                    .map(|name| ServerName::new(name.as_str()))
                    .collect()
            }),
            multicast_groups: modules
                .multicast_chat
                .server_groups
                .iter()
                .map(|group| group.iter().map(|name| ServerName::new(name.as_str())).collect())
                .collect(),
            filter_private_messages: modules.messenger.filter_private_messages,
            log_private_messages: modules.chat_logging.private_messages,
        }
    }
}
