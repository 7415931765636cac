//! Rendered chat messages and the markup layer that produces them.

pub mod format;
pub mod formatter;
pub mod plain;

pub use format::{Format, FormatSet, Notices};
pub use formatter::{FormatContext, MessageFormatter};
pub use plain::PlainRenderer;

use std::fmt;

use serde::Serialize;

use crate::channel::Context;

/// One run of a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Link(String),
    Emoji(String),
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Link(text) | Self::Emoji(text) => text,
        }
    }
}

/// Parsed, display-ready message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderedMessage {
    segments: Vec<Segment>,
}

impl RenderedMessage {
    pub fn new(segments: Vec<Segment>) -> Self {
        let mut message = Self::default();
        for segment in segments {
            message.push(segment);
        }
        message
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Segment::Text(text.into())])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Append a segment, merging adjacent text and dropping empty text.
    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Text(text) if text.is_empty() => {}
            Segment::Text(text) => match self.segments.last_mut() {
                Some(Segment::Text(last)) => last.push_str(&text),
                _ => self.segments.push(Segment::Text(text)),
            },
            other => self.segments.push(other),
        }
    }

    pub fn extend(&mut self, other: RenderedMessage) {
        for segment in other.segments {
            self.push(segment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }
}

impl fmt::Display for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl From<&str> for RenderedMessage {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for RenderedMessage {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// Turns raw text into rendered messages and fills output templates.
pub trait MarkupRenderer: Send + Sync {
    /// Parse a raw chat line.
    fn parse(&self, raw: &str) -> RenderedMessage;

    /// Fill a template from the context. `%message` expands to the context's
    /// rendered message.
    fn render(&self, template: &str, context: &Context) -> RenderedMessage;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merges_text() {
        let message = RenderedMessage::new(vec![
            Segment::Text("a".into()),
            Segment::Text("".into()),
            Segment::Text("b".into()),
            Segment::Link("https://x.org".into()),
            Segment::Text(" c".into()),
        ]);
        assert_eq!(
            message.segments(),
            &[
                Segment::Text("ab".into()),
                Segment::Link("https://x.org".into()),
                Segment::Text(" c".into()),
            ]
        );
        assert_eq!(message.plain_text(), "abhttps://x.org c");
        assert_eq!(message.to_string(), message.plain_text());
    }

    #[test]
    fn test_serialize_segments() {
        let message = RenderedMessage::new(vec![
            Segment::Text("hi ".into()),
            Segment::Emoji("😀".into()),
        ]);
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(
            json,
            r#"[{"kind":"text","value":"hi "},{"kind":"emoji","value":"😀"}]"#
        );
    }
}
