//! Shared types used across the relay.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a connected account.
pub type AccountId = u64;

/// Name of a backend game server behind the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerName(String);

impl ServerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServerName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Capabilities answered by the host's permission provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    BypassAntiDuplicate,
    BypassAntiSpam,
    BypassFilter,
    BypassMute,
    BypassIgnore,
    BypassMessenger,
    StaffChatView,
    SocialSpy,
    SocialSpyExempt,
    LocalSpy,
    LocalSpyExempt,
    JoinMessageView,
    LeaveMessageView,
    SwitchMessageView,
    VanishView,
}

impl Permission {
    /// Permission node as understood by permission plugins.
    pub fn node(&self) -> &'static str {
        match self {
            Self::BypassAntiDuplicate => "chatrelay.bypass.antiduplicate",
            Self::BypassAntiSpam => "chatrelay.bypass.antispam",
            Self::BypassFilter => "chatrelay.bypass.filter",
            Self::BypassMute => "chatrelay.bypass.mute",
            Self::BypassIgnore => "chatrelay.bypass.ignore",
            Self::BypassMessenger => "chatrelay.bypass.messenger",
            Self::StaffChatView => "chatrelay.command.staffchat.view",
            Self::SocialSpy => "chatrelay.command.socialspy",
            Self::SocialSpyExempt => "chatrelay.command.socialspy.exempt",
            Self::LocalSpy => "chatrelay.command.localspy",
            Self::LocalSpyExempt => "chatrelay.command.localspy.exempt",
            Self::JoinMessageView => "chatrelay.message.join.view",
            Self::LeaveMessageView => "chatrelay.message.leave.view",
            Self::SwitchMessageView => "chatrelay.message.switch.view",
            Self::VanishView => "chatrelay.command.vanish.view",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node())
    }
}
