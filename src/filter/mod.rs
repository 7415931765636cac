//! Message filters.
//!
//! Pre-parse filters see the raw text, post-parse filters see the rendered
//! message. Either kind may rewrite the message or block it. Filters run in
//! ascending priority order; equal priorities keep insertion order.

pub mod chain;
pub mod duplication;
pub mod emoji;
pub mod function;
pub mod mute;
pub mod pattern;
pub mod spam;

pub use chain::FilterChain;
pub use duplication::DuplicationFilter;
pub use emoji::EmojiFilter;
pub use function::FnFilter;
pub use mute::MuteFilter;
pub use pattern::PatternFilter;
pub use spam::SpamFilter;

use std::sync::Arc;

use crate::account::Account;
use crate::common::FilterResult;
use crate::render::RenderedMessage;

pub const MUTE_PRIORITY: i32 = 0;
pub const PATTERN_PRIORITY: i32 = 100;
pub const DUPLICATION_PRIORITY: i32 = 300;
pub const SPAM_PRIORITY: i32 = 400;
pub const EMOJI_PRIORITY: i32 = 600;

/// Filter over the raw message text.
pub trait PreParseFilter: Send + Sync {
    fn apply(&self, sender: &dyn Account, message: String) -> FilterResult<String>;

    fn priority(&self) -> i32 {
        0
    }
}

/// Filter over the parsed message.
pub trait PostParseFilter: Send + Sync {
    fn apply(&self, sender: &dyn Account, message: RenderedMessage)
        -> FilterResult<RenderedMessage>;

    fn priority(&self) -> i32 {
        0
    }
}

/// The two filter chains of a relay.
#[derive(Default)]
pub struct Filters {
    pre_parse: FilterChain<dyn PreParseFilter>,
    post_parse: FilterChain<dyn PostParseFilter>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-parse filter under `key`, replacing any previous one.
    pub fn add_pre_parse_filter(&self, key: &str, filter: Arc<dyn PreParseFilter>) {
        let priority = filter.priority();
        self.pre_parse.insert(key, priority, filter);
    }

    pub fn remove_pre_parse_filter(&self, key: &str) -> bool {
        self.pre_parse.remove(key)
    }

    /// Register a post-parse filter under `key`, replacing any previous one.
    pub fn add_post_parse_filter(&self, key: &str, filter: Arc<dyn PostParseFilter>) {
        let priority = filter.priority();
        self.post_parse.insert(key, priority, filter);
    }

    pub fn remove_post_parse_filter(&self, key: &str) -> bool {
        self.post_parse.remove(key)
    }

    pub fn apply_pre_parse(&self, sender: &dyn Account, message: String) -> FilterResult<String> {
        self.pre_parse
            .snapshot()
            .iter()
            .try_fold(message, |message, entry| entry.filter.apply(sender, message))
    }

    pub fn apply_post_parse(
        &self,
        sender: &dyn Account,
        message: RenderedMessage,
    ) -> FilterResult<RenderedMessage> {
        self.post_parse
            .snapshot()
            .iter()
            .try_fold(message, |message, entry| entry.filter.apply(sender, message))
    }

    pub fn pre_parse_keys(&self) -> Vec<String> {
        self.pre_parse.keys()
    }

    pub fn post_parse_keys(&self) -> Vec<String> {
        self.post_parse.keys()
    }
}
