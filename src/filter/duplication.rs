//! Blocks a sender from repeating one of their recent messages.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::{PreParseFilter, DUPLICATION_PRIORITY};
use crate::account::Account;
use crate::common::{AccountId, BlockMessage, Clock, FilterResult, Permission};
use crate::render::RenderedMessage;

#[derive(Debug)]
struct TimedMessage {
    at: Instant,
    text: String,
}

/// Remembers the last few messages of every sender within a time window.
#[derive(Debug)]
pub struct DuplicationFilter {
    history: DashMap<AccountId, VecDeque<TimedMessage>>,
    check_past_messages: usize,
    expire_after: Duration,
    clock: Arc<dyn Clock>,
    reason: RenderedMessage,
    check_permissions: bool,
}

impl DuplicationFilter {
    pub fn new(
        check_past_messages: usize,
        expire_after: Duration,
        clock: Arc<dyn Clock>,
        reason: impl Into<RenderedMessage>,
    ) -> Self {
        Self {
            history: DashMap::new(),
            check_past_messages,
            expire_after,
            clock,
            reason: reason.into(),
            check_permissions: true,
        }
    }

    /// Apply to every sender, including those with the bypass permission.
    pub fn without_permission_checks(mut self) -> Self {
        self.check_permissions = false;
        self
    }

    #[cfg(test)]
    fn remembered(&self, sender: AccountId) -> usize {
        self.history.get(&sender).map_or(0, |history| history.len())
    }
}

impl PreParseFilter for DuplicationFilter {
    fn apply(&self, sender: &dyn Account, message: String) -> FilterResult<String> {
        if self.check_past_messages == 0
            || (self.check_permissions && sender.has_permission(Permission::BypassAntiDuplicate))
        {
            return Ok(message);
        }

        let now = self.clock.now();

        // The entry guard keeps the whole check-and-record step atomic per sender.
        let mut history = self
            .history
            .entry(sender.id())
            .or_insert_with(|| VecDeque::with_capacity(self.check_past_messages));

        while history
            .front()
            .is_some_and(|oldest| now.duration_since(oldest.at) > self.expire_after)
        {
            history.pop_front();
        }

        if history.iter().any(|past| past.text == message) {
            debug!(sender = sender.id(), "Blocked duplicate message");
            return Err(BlockMessage::new(self.reason.clone()));
        }

        if history.len() >= self.check_past_messages {
            history.pop_front();
        }
        history.push_back(TimedMessage {
            at: now,
            text: message.clone(),
        });

        Ok(message)
    }

    fn priority(&self) -> i32 {
        DUPLICATION_PRIORITY
    }
}
