//! Limits how many messages a sender may send per minute.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::{PreParseFilter, SPAM_PRIORITY};
use crate::account::Account;
use crate::common::{AccountId, BlockMessage, Clock, FilterResult, Permission};
use crate::render::RenderedMessage;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding one-minute rate limit per sender.
#[derive(Debug)]
pub struct SpamFilter {
    history: DashMap<AccountId, VecDeque<Instant>>,
    messages_per_minute: usize,
    clock: Arc<dyn Clock>,
    reason: RenderedMessage,
}

impl SpamFilter {
    pub fn new(
        messages_per_minute: usize,
        clock: Arc<dyn Clock>,
        reason: impl Into<RenderedMessage>,
    ) -> Self {
        Self {
            history: DashMap::new(),
            messages_per_minute,
            clock,
            reason: reason.into(),
        }
    }
}

impl PreParseFilter for SpamFilter {
    fn apply(&self, sender: &dyn Account, message: String) -> FilterResult<String> {
        if sender.has_permission(Permission::BypassAntiSpam) {
            return Ok(message);
        }

        let now = self.clock.now();
        let mut sent = self.history.entry(sender.id()).or_default();

        while sent
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= WINDOW)
        {
            sent.pop_front();
        }

        if sent.len() >= self.messages_per_minute {
            debug!(
                sender = sender.id(),
                limit = self.messages_per_minute,
                "Blocked message over rate limit"
            );
            return Err(BlockMessage::new(self.reason.clone()));
        }

        sent.push_back(now);
        Ok(message)
    }

    fn priority(&self) -> i32 {
        SPAM_PRIORITY
    }
}
