//! Blocks messages matching configured regex patterns.

use fancy_regex::Regex;
use tracing::warn;

use super::{PreParseFilter, PATTERN_PRIORITY};
use crate::account::Account;
use crate::common::{BlockMessage, FilterResult, Permission};
use crate::render::RenderedMessage;

/// Message filter that checks messages against regex patterns.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    patterns: Vec<CompiledPattern>,
    reason: RenderedMessage,
}

/// A compiled regex pattern with its original string for debugging.
#[derive(Debug, Clone)]
struct CompiledPattern {
    original: String,
    regex: Regex,
}

impl PatternFilter {
    /// Create a filter from pattern strings.
    ///
    /// Invalid regex patterns are logged and skipped.
    pub fn new(patterns: Vec<String>, reason: impl Into<RenderedMessage>) -> Self {
        Self {
            patterns: compile_patterns(patterns),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the message matches any pattern and should be blocked.
    pub fn should_filter(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| {
            p.regex.is_match(message).unwrap_or_else(|e| {
                warn!("Regex match error for pattern '{}': {}", p.original, e);
                false
            })
        })
    }

    pub fn has_patterns(&self) -> bool {
        !self.patterns.is_empty()
    }
}

impl PreParseFilter for PatternFilter {
    fn apply(&self, sender: &dyn Account, message: String) -> FilterResult<String> {
        if sender.has_permission(Permission::BypassFilter) || !self.should_filter(&message) {
            return Ok(message);
        }
        Err(BlockMessage::new(self.reason.clone()))
    }

    fn priority(&self) -> i32 {
        PATTERN_PRIORITY
    }
}

/// Compile a list of regex pattern strings, skipping invalid ones.
fn compile_patterns(patterns: Vec<String>) -> Vec<CompiledPattern> {
    patterns
        .into_iter()
        .filter_map(|pattern| match Regex::new(&pattern) {
            Ok(regex) => Some(CompiledPattern {
                original: pattern,
                regex,
            }),
            Err(e) => {
                warn!("Invalid filter regex pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}
