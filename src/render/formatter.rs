//! Placeholder substitution for output templates.
//!
//! Supports placeholders: %time, %user, %target, %server, %channel.
//! `%message` is left in place for the renderer to splice.

use chrono::Local;

use crate::channel::Context;

const PLACEHOLDERS: [&str; 5] = ["%time", "%user", "%target", "%server", "%channel"];

/// Substitutes placeholders in a template string.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    format: String,
}

impl MessageFormatter {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// Format the template with the given context.
    ///
    /// - `%time` - Current time (HH:MM:SS)
    /// - `%user` - Sender name
    /// - `%target` - Private message target
    /// - `%server` - Server the message concerns
    /// - `%channel` - Channel name
    ///
    /// The template is scanned once, so substituted values are never expanded again.
    pub fn format(&self, ctx: &FormatContext) -> String {
        let mut out = String::with_capacity(self.format.len());
        let mut rest = self.format.as_str();

        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            rest = &rest[start..];
            match PLACEHOLDERS.iter().find(|p| rest.starts_with(**p)) {
                Some(placeholder) => {
                    out.push_str(&ctx.value(placeholder));
                    rest = &rest[placeholder.len()..];
                }
                None => {
                    out.push('%');
                    rest = &rest[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct FormatContext {
    pub user: String,
    pub target: String,
    pub server: String,
    pub channel: String,
}

impl FormatContext {
    fn value(&self, placeholder: &str) -> String {
        match placeholder {
            "%time" => get_time(),
            "%user" => self.user.clone(),
            "%target" => self.target.clone(),
            "%server" => self.server.clone(),
            "%channel" => self.channel.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&Context> for FormatContext {
    fn from(context: &Context) -> Self {
        Self {
            user: context.sender().map(|s| s.name()).unwrap_or_default(),
            target: context.target().map(|t| t.name()).unwrap_or_default(),
            server: context
                .server()
                .map(|s| s.to_string())
                .unwrap_or_default(),
            channel: context
                .channel()
                .map(|c| c.to_string())
                .unwrap_or_default(),
        }
    }
}

fn get_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
