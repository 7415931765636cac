//! The closed set of channel variants and their delivery rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::ContextResult;

use super::context::{Context, Requirement};

/// Fixed behaviour of a channel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Recipients who ignore the sender are skipped.
    pub ignorable: bool,
    /// Messages are written to the chat log.
    pub loggable: bool,
    /// A vanished sender is only visible to accounts holding the vanish view permission.
    pub respects_vanish: bool,
    pub requirements: &'static [Requirement],
}

/// Checked for every channel before its own requirements.
const BASE_REQUIREMENTS: &[Requirement] = &[Requirement::HAS_CHANNEL, Requirement::HAS_SENDER];

const DEFAULT_REQUIREMENTS: &[Requirement] = &[
    Requirement::HAS_MESSAGE,
    Requirement::IS_PARSED,
    Requirement::HAS_NO_TARGET,
];

const SERVER_BOUND_REQUIREMENTS: &[Requirement] = &[
    Requirement::HAS_MESSAGE,
    Requirement::IS_PARSED,
    Requirement::HAS_NO_TARGET,
    Requirement::HAS_SERVER,
];

const PRIVATE_REQUIREMENTS: &[Requirement] = &[
    Requirement::HAS_TARGET,
    Requirement::HAS_MESSAGE,
    Requirement::IS_PARSED,
];

const PRESENCE_REQUIREMENTS: &[Requirement] =
    &[Requirement::HAS_NO_MESSAGE, Requirement::HAS_NO_TARGET];

const SWITCH_REQUIREMENTS: &[Requirement] = &[
    Requirement::HAS_NO_MESSAGE,
    Requirement::HAS_SERVER,
    Requirement::HAS_NO_TARGET,
];

const GLOBAL: ChannelSpec = ChannelSpec {
    ignorable: true,
    loggable: true,
    respects_vanish: false,
    requirements: DEFAULT_REQUIREMENTS,
};

const LOCAL: ChannelSpec = ChannelSpec {
    ignorable: true,
    loggable: true,
    respects_vanish: false,
    requirements: SERVER_BOUND_REQUIREMENTS,
};

const MULTICAST: ChannelSpec = ChannelSpec {
    ignorable: true,
    loggable: false,
    respects_vanish: false,
    requirements: SERVER_BOUND_REQUIREMENTS,
};

const STAFF: ChannelSpec = ChannelSpec {
    ignorable: false,
    loggable: true,
    respects_vanish: false,
    requirements: DEFAULT_REQUIREMENTS,
};

const PRIVATE: ChannelSpec = ChannelSpec {
    ignorable: true,
    loggable: true,
    respects_vanish: false,
    requirements: PRIVATE_REQUIREMENTS,
};

const JOIN: ChannelSpec = ChannelSpec {
    ignorable: false,
    loggable: false,
    respects_vanish: true,
    requirements: PRESENCE_REQUIREMENTS,
};

const LEAVE: ChannelSpec = JOIN;

const SWITCH: ChannelSpec = ChannelSpec {
    ignorable: false,
    loggable: false,
    respects_vanish: true,
    requirements: SWITCH_REQUIREMENTS,
};

const ALERT: ChannelSpec = ChannelSpec {
    ignorable: false,
    loggable: true,
    respects_vanish: false,
    requirements: DEFAULT_REQUIREMENTS,
};

/// Every kind of message the relay can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Global,
    Local,
    Multicast,
    Staff,
    Private,
    Join,
    Leave,
    Switch,
    Alert,
}

impl ChannelType {
    pub const ALL: [ChannelType; 9] = [
        Self::Global,
        Self::Local,
        Self::Multicast,
        Self::Staff,
        Self::Private,
        Self::Join,
        Self::Leave,
        Self::Switch,
        Self::Alert,
    ];

    pub const fn spec(self) -> &'static ChannelSpec {
        match self {
            Self::Global => &GLOBAL,
            Self::Local => &LOCAL,
            Self::Multicast => &MULTICAST,
            Self::Staff => &STAFF,
            Self::Private => &PRIVATE,
            Self::Join => &JOIN,
            Self::Leave => &LEAVE,
            Self::Switch => &SWITCH,
            Self::Alert => &ALERT,
        }
    }

    pub fn is_ignorable(self) -> bool {
        self.spec().ignorable
    }

    pub fn is_loggable(self) -> bool {
        self.spec().loggable
    }

    pub fn respects_vanish(self) -> bool {
        self.spec().respects_vanish
    }

    pub fn requirements(self) -> &'static [Requirement] {
        self.spec().requirements
    }

    /// Full check: channel and sender present, then every requirement of the variant.
    pub fn check_requirements(self, context: &Context) -> ContextResult<()> {
        context.require(BASE_REQUIREMENTS)?;
        context.require(self.requirements())
    }

    /// Structural check run before the pipeline touches the message.
    ///
    /// Requirements on filtering or parsing progress are skipped here; the
    /// dispatcher asserts them once the message has been parsed.
    pub fn check_structure(self, context: &Context) -> ContextResult<()> {
        context.require(BASE_REQUIREMENTS)?;
        let structural: Vec<Requirement> = self
            .requirements()
            .iter()
            .copied()
            .filter(|requirement| !requirement.is_deferred())
            .collect();
        context.require(&structural)
    }

    /// Requirements skipped by [`check_structure`](Self::check_structure).
    pub fn check_progress(self, context: &Context) -> ContextResult<()> {
        let deferred: Vec<Requirement> = self
            .requirements()
            .iter()
            .copied()
            .filter(Requirement::is_deferred)
            .collect();
        context.require(&deferred)
    }

    /// Upper-case label used in chat logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Local => "LOCAL",
            Self::Multicast => "MULTICAST",
            Self::Staff => "STAFF",
            Self::Private => "PRIVATE",
            Self::Join => "JOIN",
            Self::Leave => "LEAVE",
            Self::Switch => "SWITCH",
            Self::Alert => "ALERT",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

impl FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown channel type: {}", s))
    }
}
