//! Toggleable relay features.
//!
//! Filter-backed modules register their filters under the module name when
//! enabled and remove them when disabled. The others are flags the dispatcher
//! consults.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::Clock;
use crate::config::ModulesConfig;
use crate::filter::{
    DuplicationFilter, EmojiFilter, Filters, MuteFilter, PatternFilter, PostParseFilter,
    PreParseFilter, SpamFilter,
};
use crate::render::Notices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    AntiDuplication,
    AntiSpam,
    Filter,
    Muting,
    Emoji,
    Spy,
    MulticastChat,
    GlobalChat,
    Ignoring,
    ChatLogging,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 10] = [
        Self::AntiDuplication,
        Self::AntiSpam,
        Self::Filter,
        Self::Muting,
        Self::Emoji,
        Self::Spy,
        Self::MulticastChat,
        Self::GlobalChat,
        Self::Ignoring,
        Self::ChatLogging,
    ];

    /// Name used as the filter key.
    pub fn name(self) -> &'static str {
        match self {
            Self::AntiDuplication => "AntiDuplication",
            Self::AntiSpam => "AntiSpam",
            Self::Filter => "Filter",
            Self::Muting => "Muting",
            Self::Emoji => "Emoji",
            Self::Spy => "Spy",
            Self::MulticastChat => "MulticastChat",
            Self::GlobalChat => "GlobalChat",
            Self::Ignoring => "Ignoring",
            Self::ChatLogging => "ChatLogging",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown module: {}", s))
    }
}

/// Filters a module contributes while enabled.
#[derive(Clone, Default)]
struct ModuleFilters {
    pre_parse: Option<Arc<dyn PreParseFilter>>,
    post_parse: Option<Arc<dyn PostParseFilter>>,
}

/// Tracks which modules are active and keeps their filters registered.
pub struct ModuleRegistry {
    filters: Arc<Filters>,
    module_filters: HashMap<ModuleKind, ModuleFilters>,
    active: RwLock<HashSet<ModuleKind>>,
}

impl ModuleRegistry {
    /// A registry with every module disabled and no filters.
    pub fn new(filters: Arc<Filters>) -> Self {
        Self {
            filters,
            module_filters: HashMap::new(),
            active: RwLock::new(HashSet::new()),
        }
    }

    /// Build filters from config and enable the modules it turns on.
    pub fn from_config(
        config: &ModulesConfig,
        notices: &Notices,
        filters: Arc<Filters>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut registry = Self::new(filters);

        let duplication = DuplicationFilter::new(
            config.anti_duplication.check_past_messages,
            Duration::from_secs(config.anti_duplication.expire_after),
            Arc::clone(&clock),
            notices.anti_duplication.as_str(),
        );
        registry.set_pre_parse_filter(ModuleKind::AntiDuplication, Arc::new(duplication));

        let spam = SpamFilter::new(
            config.anti_spam.messages_per_minute,
            clock,
            notices.anti_spam.as_str(),
        );
        registry.set_pre_parse_filter(ModuleKind::AntiSpam, Arc::new(spam));

        let patterns = PatternFilter::new(
            config.filter.patterns.clone(),
            notices.blocked_by_filter.as_str(),
        );
        registry.set_pre_parse_filter(ModuleKind::Filter, Arc::new(patterns));

        registry.set_pre_parse_filter(
            ModuleKind::Muting,
            Arc::new(MuteFilter::new(notices.muted.as_str())),
        );

        registry.set_post_parse_filter(
            ModuleKind::Emoji,
            Arc::new(EmojiFilter::new(config.emoji.custom.clone())),
        );

        let enabled = [
            (ModuleKind::AntiDuplication, config.anti_duplication.enabled),
            (ModuleKind::AntiSpam, config.anti_spam.enabled),
            (ModuleKind::Filter, config.filter.enabled),
            (ModuleKind::Muting, config.muting.enabled),
            (ModuleKind::Emoji, config.emoji.enabled),
            (ModuleKind::Spy, config.spy.enabled),
            (ModuleKind::MulticastChat, config.multicast_chat.enabled),
            (ModuleKind::GlobalChat, config.global_chat.enabled),
            (ModuleKind::Ignoring, config.ignoring.enabled),
            (ModuleKind::ChatLogging, config.chat_logging.enabled),
        ];
        for (kind, on) in enabled {
            if on {
                registry.enable(kind);
            }
        }

        registry
    }

    /// Attach a pre-parse filter to a module. Takes effect on next enable.
    pub fn set_pre_parse_filter(&mut self, kind: ModuleKind, filter: Arc<dyn PreParseFilter>) {
        self.module_filters.entry(kind).or_default().pre_parse = Some(filter);
    }

    /// Attach a post-parse filter to a module. Takes effect on next enable.
    pub fn set_post_parse_filter(&mut self, kind: ModuleKind, filter: Arc<dyn PostParseFilter>) {
        self.module_filters.entry(kind).or_default().post_parse = Some(filter);
    }

    pub fn filters(&self) -> &Arc<Filters> {
        &self.filters
    }

    pub fn is_active(&self, kind: ModuleKind) -> bool {
        self.active.read().contains(&kind)
    }

    pub fn active_modules(&self) -> Vec<ModuleKind> {
        ModuleKind::ALL
            .into_iter()
            .filter(|kind| self.is_active(*kind))
            .collect()
    }

    /// Returns false if the module was already enabled.
    pub fn enable(&self, kind: ModuleKind) -> bool {
        let mut active = self.active.write();
        if !active.insert(kind) {
            return false;
        }
        if let Some(module) = self.module_filters.get(&kind) {
            if let Some(filter) = &module.pre_parse {
                self.filters.add_pre_parse_filter(kind.name(), Arc::clone(filter));
            }
            if let Some(filter) = &module.post_parse {
                self.filters.add_post_parse_filter(kind.name(), Arc::clone(filter));
            }
        }
        info!(module = %kind, "Module enabled");
        true
    }

    /// Returns false if the module was not enabled.
    pub fn disable(&self, kind: ModuleKind) -> bool {
        let mut active = self.active.write();
        if !active.remove(&kind) {
            return false;
        }
        self.filters.remove_pre_parse_filter(kind.name());
        self.filters.remove_post_parse_filter(kind.name());
        info!(module = %kind, "Module disabled");
        true
    }

    pub fn set_enabled(&self, kind: ModuleKind, enabled: bool) -> bool {
        if enabled {
            self.enable(kind)
        } else {
            self.disable(kind)
        }
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("active", &self.active_modules())
            .finish()
    }
}
