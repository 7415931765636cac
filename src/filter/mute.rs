//! Blocks every message from muted senders.

use super::{PreParseFilter, MUTE_PRIORITY};
use crate::account::Account;
use crate::common::{BlockMessage, FilterResult, Permission};
use crate::render::RenderedMessage;

#[derive(Debug, Clone)]
pub struct MuteFilter {
    reason: RenderedMessage,
}

impl MuteFilter {
    pub fn new(reason: impl Into<RenderedMessage>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PreParseFilter for MuteFilter {
    fn apply(&self, sender: &dyn Account, message: String) -> FilterResult<String> {
        if sender.is_muted() && !sender.has_permission(Permission::BypassMute) {
            return Err(BlockMessage::new(self.reason.clone()));
        }
        Ok(message)
    }

    fn priority(&self) -> i32 {
        MUTE_PRIORITY
    }
}
