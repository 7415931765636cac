//! Replaces `:shortcode:` sequences with emoji after parsing.

use std::collections::HashMap;

use super::{PostParseFilter, EMOJI_PRIORITY};
use crate::account::Account;
use crate::common::FilterResult;
use crate::render::{RenderedMessage, Segment};

/// Post-parse filter resolving shortcodes from the Unicode emoji set and
/// configured custom entries. Custom entries win.
#[derive(Debug, Clone, Default)]
pub struct EmojiFilter {
    custom: HashMap<String, String>,
}

impl EmojiFilter {
    pub fn new(custom: HashMap<String, String>) -> Self {
        let custom = custom
            .into_iter()
            .map(|(name, glyph)| (name.to_lowercase(), glyph))
            .collect();
        Self { custom }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'));
        if !valid {
            return None;
        }
        self.custom
            .get(&name.to_lowercase())
            .map(String::as_str)
            .or_else(|| emojis::get_by_shortcode(name).map(|emoji| emoji.as_str()))
    }

    fn substitute(&self, text: &str, out: &mut RenderedMessage) {
        let mut rest = text;
        while let Some(start) = rest.find(':') {
            let after = &rest[start + 1..];
            let Some(end) = after.find(':') else {
                break;
            };
            match self.lookup(&after[..end]) {
                Some(glyph) => {
                    out.push(Segment::Text(rest[..start].to_string()));
                    out.push(Segment::Emoji(glyph.to_string()));
                    rest = &after[end + 1..];
                }
                None => {
                    out.push(Segment::Text(rest[..=start].to_string()));
                    rest = after;
                }
            }
        }
        out.push(Segment::Text(rest.to_string()));
    }
}

impl PostParseFilter for EmojiFilter {
    fn apply(
        &self,
        _sender: &dyn Account,
        message: RenderedMessage,
    ) -> FilterResult<RenderedMessage> {
        let mut out = RenderedMessage::default();
        for segment in message.into_segments() {
            match segment {
                Segment::Text(text) => self.substitute(&text, &mut out),
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn priority(&self) -> i32 {
        EMOJI_PRIORITY
    }
}
