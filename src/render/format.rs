//! Output templates and user-facing notices.

use serde::Deserialize;

/// Which template a delivery uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    GlobalChat,
    LocalChat,
    MulticastChat,
    StaffChat,
    Alert,
    MessageSender,
    MessageTarget,
    SocialSpy,
    LocalSpy,
    JoinMessage,
    LeaveMessage,
    ServerSwitch,
}

impl Format {
    pub const ALL: [Format; 12] = [
        Self::GlobalChat,
        Self::LocalChat,
        Self::MulticastChat,
        Self::StaffChat,
        Self::Alert,
        Self::MessageSender,
        Self::MessageTarget,
        Self::SocialSpy,
        Self::LocalSpy,
        Self::JoinMessage,
        Self::LeaveMessage,
        Self::ServerSwitch,
    ];

    /// Config key of the template.
    pub fn key(self) -> &'static str {
        match self {
            Self::GlobalChat => "global-chat",
            Self::LocalChat => "local-chat",
            Self::MulticastChat => "multicast-chat",
            Self::StaffChat => "staff-chat",
            Self::Alert => "alert",
            Self::MessageSender => "message-sender",
            Self::MessageTarget => "message-target",
            Self::SocialSpy => "social-spy",
            Self::LocalSpy => "local-spy",
            Self::JoinMessage => "join-message",
            Self::LeaveMessage => "leave-message",
            Self::ServerSwitch => "server-switch",
        }
    }

    /// Whether the template carries a chat line and must contain `%message`.
    pub fn carries_message(self) -> bool {
        !matches!(
            self,
            Self::JoinMessage | Self::LeaveMessage | Self::ServerSwitch
        )
    }
}

/// Configurable output templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormatSet {
    pub global_chat: String,
    pub local_chat: String,
    pub multicast_chat: String,
    pub staff_chat: String,
    pub alert: String,
    pub message_sender: String,
    pub message_target: String,
    pub social_spy: String,
    pub local_spy: String,
    pub join_message: String,
    pub leave_message: String,
    pub server_switch: String,
}

impl Default for FormatSet {
    fn default() -> Self {
        Self {
            global_chat: "[Global] %user: %message".to_string(),
            local_chat: "[%server] %user: %message".to_string(),
            multicast_chat: "[%server] %user: %message".to_string(),
            staff_chat: "[Staff] %user: %message".to_string(),
            alert: "[Alert] %message".to_string(),
            message_sender: "[me -> %target] %message".to_string(),
            message_target: "[%user -> me] %message".to_string(),
            social_spy: "[Spy] %user -> %target: %message".to_string(),
            local_spy: "[Spy %server] %user: %message".to_string(),
            join_message: "%user has joined the network".to_string(),
            leave_message: "%user has left the network".to_string(),
            server_switch: "%user has moved to %server".to_string(),
        }
    }
}

impl FormatSet {
    pub fn get(&self, format: Format) -> &str {
        match format {
            Format::GlobalChat => &self.global_chat,
            Format::LocalChat => &self.local_chat,
            Format::MulticastChat => &self.multicast_chat,
            Format::StaffChat => &self.staff_chat,
            Format::Alert => &self.alert,
            Format::MessageSender => &self.message_sender,
            Format::MessageTarget => &self.message_target,
            Format::SocialSpy => &self.social_spy,
            Format::LocalSpy => &self.local_spy,
            Format::JoinMessage => &self.join_message,
            Format::LeaveMessage => &self.leave_message,
            Format::ServerSwitch => &self.server_switch,
        }
    }
}

/// Texts sent back to a sender whose message was blocked or refused.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Notices {
    pub anti_duplication: String,
    pub anti_spam: String,
    pub blocked_by_filter: String,
    pub muted: String,
    pub has_ignored: String,
    pub messenger_disabled: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            anti_duplication: "Please do not repeat the same message.".to_string(),
            anti_spam: "You are sending messages too fast.".to_string(),
            blocked_by_filter: "Your message contains blocked words.".to_string(),
            muted: "You are muted.".to_string(),
            has_ignored: "That player is ignoring you.".to_string(),
            messenger_disabled: "That player does not accept private messages.".to_string(),
        }
    }
}
