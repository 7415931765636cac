//! Message context and the requirement predicates that validate it.

use std::fmt;

use crate::account::AccountRef;
use crate::common::{ContextError, ContextResult, ServerName};
use crate::render::RenderedMessage;

use super::ChannelType;

/// A slot of the context a requirement can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Sender,
    Target,
    Message,
    Channel,
    Server,
    Filtered,
    Parsed,
}

impl Field {
    fn present_name(self) -> &'static str {
        match self {
            Self::Sender => "HAS_SENDER",
            Self::Target => "HAS_TARGET",
            Self::Message => "HAS_MESSAGE",
            Self::Channel => "HAS_CHANNEL",
            Self::Server => "HAS_SERVER",
            Self::Filtered => "IS_FILTERED",
            Self::Parsed => "IS_PARSED",
        }
    }

    fn absent_name(self) -> &'static str {
        match self {
            Self::Sender => "HAS_NO_SENDER",
            Self::Target => "HAS_NO_TARGET",
            Self::Message => "HAS_NO_MESSAGE",
            Self::Channel => "HAS_NO_CHANNEL",
            Self::Server => "HAS_NO_SERVER",
            Self::Filtered => "IS_NOT_FILTERED",
            Self::Parsed => "IS_NOT_PARSED",
        }
    }
}

/// A named, side-effect free predicate over a [`Context`].
///
/// Requirements are plain values so that channel definitions can hold them in
/// constant tables. Conjunctions borrow their parts statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Present(Field),
    Absent(Field),
    All(&'static [Requirement]),
    NotAll(&'static [Requirement]),
}

impl Requirement {
    pub const HAS_SENDER: Self = Self::Present(Field::Sender);
    pub const HAS_TARGET: Self = Self::Present(Field::Target);
    pub const HAS_MESSAGE: Self = Self::Present(Field::Message);
    pub const HAS_CHANNEL: Self = Self::Present(Field::Channel);
    pub const HAS_SERVER: Self = Self::Present(Field::Server);
    pub const IS_FILTERED: Self = Self::Present(Field::Filtered);
    pub const IS_PARSED: Self = Self::Present(Field::Parsed);

    pub const HAS_NO_SENDER: Self = Self::Absent(Field::Sender);
    pub const HAS_NO_TARGET: Self = Self::Absent(Field::Target);
    pub const HAS_NO_MESSAGE: Self = Self::Absent(Field::Message);
    pub const HAS_NO_CHANNEL: Self = Self::Absent(Field::Channel);
    pub const HAS_NO_SERVER: Self = Self::Absent(Field::Server);
    pub const IS_NOT_FILTERED: Self = Self::Absent(Field::Filtered);
    pub const IS_NOT_PARSED: Self = Self::Absent(Field::Parsed);

    /// Logical negation.
    pub const fn negate(self) -> Self {
        match self {
            Self::Present(field) => Self::Absent(field),
            Self::Absent(field) => Self::Present(field),
            Self::All(parts) => Self::NotAll(parts),
            Self::NotAll(parts) => Self::All(parts),
        }
    }

    pub fn test(&self, context: &Context) -> bool {
        match self {
            Self::Present(field) => context.has(*field),
            Self::Absent(field) => !context.has(*field),
            Self::All(parts) => parts.iter().all(|part| part.test(context)),
            Self::NotAll(parts) => !parts.iter().all(|part| part.test(context)),
        }
    }

    /// Whether this requirement depends on pipeline progress rather than structure.
    pub fn is_deferred(&self) -> bool {
        match self {
            Self::Present(field) | Self::Absent(field) => {
                matches!(field, Field::Filtered | Field::Parsed)
            }
            Self::All(parts) | Self::NotAll(parts) => parts.iter().any(Requirement::is_deferred),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(field) => f.write_str(field.present_name()),
            Self::Absent(field) => f.write_str(field.absent_name()),
            Self::All(parts) => write_all(f, parts),
            Self::NotAll(parts) => {
                f.write_str("NOT(")?;
                write_all(f, parts)?;
                f.write_str(")")
            }
        }
    }
}

fn write_all(f: &mut fmt::Formatter<'_>, parts: &[Requirement]) -> fmt::Result {
    f.write_str("ALL(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{part}")?;
    }
    f.write_str(")")
}

/// Everything known about one message or event in flight.
///
/// Built by the caller, validated against its channel, then enriched by the
/// pipeline. The filtered and rendered slots are written once each and their
/// flags never go back to false.
#[derive(Debug, Clone, Default)]
pub struct Context {
    sender: Option<AccountRef>,
    target: Option<AccountRef>,
    message: Option<String>,
    filtered_message: Option<String>,
    rendered_message: Option<RenderedMessage>,
    channel: Option<ChannelType>,
    server: Option<ServerName>,
    filtered: bool,
    parsed: bool,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a sender, located on the sender's current server.
    pub fn for_sender(sender: AccountRef) -> Self {
        let server = sender.server();
        Self {
            sender: Some(sender),
            server,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: AccountRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_channel(mut self, channel: ChannelType) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_server(mut self, server: impl Into<ServerName>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Sender => self.sender.is_some(),
            Field::Target => self.target.is_some(),
            Field::Message => self.message.is_some(),
            Field::Channel => self.channel.is_some(),
            Field::Server => self.server.is_some(),
            Field::Filtered => self.filtered,
            Field::Parsed => self.parsed,
        }
    }

    /// Check every requirement, failing on the first unmet one.
    pub fn require(&self, requirements: &[Requirement]) -> ContextResult<()> {
        match requirements.iter().find(|requirement| !requirement.test(self)) {
            Some(unmet) => Err(ContextError::missing(unmet)),
            None => Ok(()),
        }
    }

    pub fn sender(&self) -> Option<&AccountRef> {
        self.sender.as_ref()
    }

    pub fn target(&self) -> Option<&AccountRef> {
        self.target.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn filtered_message(&self) -> Option<&str> {
        self.filtered_message.as_deref()
    }

    pub fn rendered_message(&self) -> Option<&RenderedMessage> {
        self.rendered_message.as_ref()
    }

    pub fn channel(&self) -> Option<ChannelType> {
        self.channel
    }

    pub fn server(&self) -> Option<&ServerName> {
        self.server.as_ref()
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn require_sender(&self) -> ContextResult<&AccountRef> {
        self.sender
            .as_ref()
            .ok_or_else(|| ContextError::missing(Requirement::HAS_SENDER))
    }

    pub fn require_target(&self) -> ContextResult<&AccountRef> {
        self.target
            .as_ref()
            .ok_or_else(|| ContextError::missing(Requirement::HAS_TARGET))
    }

    pub fn require_message(&self) -> ContextResult<&str> {
        self.message
            .as_deref()
            .ok_or_else(|| ContextError::missing(Requirement::HAS_MESSAGE))
    }

    pub fn require_server(&self) -> ContextResult<&ServerName> {
        self.server
            .as_ref()
            .ok_or_else(|| ContextError::missing(Requirement::HAS_SERVER))
    }

    pub fn require_rendered(&self) -> ContextResult<&RenderedMessage> {
        self.rendered_message
            .as_ref()
            .ok_or_else(|| ContextError::missing(Requirement::IS_PARSED))
    }

    /// Most processed text available: filtered, else raw, else rendered.
    pub fn best_text(&self) -> Option<String> {
        self.filtered_message
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.rendered_message.as_ref().map(RenderedMessage::plain_text))
    }

    pub fn set_channel(&mut self, channel: ChannelType) {
        self.channel = Some(channel);
    }

    pub fn set_server(&mut self, server: ServerName) {
        self.server = Some(server);
    }

    /// Store the pre-parse filter result. Allowed once per context.
    pub fn set_filtered_message(&mut self, message: String) -> ContextResult<()> {
        self.require(&[Requirement::IS_NOT_FILTERED])?;
        self.filtered_message = Some(message);
        self.filtered = true;
        Ok(())
    }

    /// Store the parsed message. Allowed once per context.
    pub fn set_rendered_message(&mut self, message: RenderedMessage) -> ContextResult<()> {
        self.require(&[Requirement::IS_NOT_PARSED])?;
        self.rendered_message = Some(message);
        self.parsed = true;
        Ok(())
    }
}
