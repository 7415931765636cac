//! Plain-text markup renderer.
//!
//! Raw text stays text except for URLs, which become link segments. Templates
//! go through [`MessageFormatter`] and splice the parsed message at `%message`.

use super::formatter::{FormatContext, MessageFormatter};
use super::{MarkupRenderer, RenderedMessage, Segment};
use crate::channel::Context;

const MESSAGE_PLACEHOLDER: &str = "%message";

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl PlainRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn is_url(word: &str) -> bool {
    let rest = word
        .strip_prefix("https://")
        .or_else(|| word.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

impl MarkupRenderer for PlainRenderer {
    fn parse(&self, raw: &str) -> RenderedMessage {
        let mut message = RenderedMessage::default();
        for (i, word) in raw.split(' ').enumerate() {
            if i > 0 {
                message.push(Segment::Text(" ".to_string()));
            }
            if is_url(word) {
                message.push(Segment::Link(word.to_string()));
            } else {
                message.push(Segment::Text(word.to_string()));
            }
        }
        message
    }

    fn render(&self, template: &str, context: &Context) -> RenderedMessage {
        let values = FormatContext::from(context);
        let body = context.rendered_message();

        let mut rendered = RenderedMessage::default();
        for (i, piece) in template.split(MESSAGE_PLACEHOLDER).enumerate() {
            if i > 0 {
                if let Some(body) = body {
                    rendered.extend(body.clone());
                }
            }
            let text = MessageFormatter::new(piece).format(&values);
            rendered.push(Segment::Text(text));
        }
        rendered
    }
}
