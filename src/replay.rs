//! Event replay.
//!
//! Drives a [`Dispatcher`] from newline-delimited JSON events and writes every
//! delivery as a JSON line. The binary feeds it stdin, tests feed it strings.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::account::{Account, AccountDirectory, InMemoryDirectory, PlayerAccount};
use crate::channel::ChannelType;
use crate::common::error::Result;
use crate::common::{AccountId, Clock, Permission, ReplayError, ServerName, SystemClock};
use crate::config::Config;
use crate::dispatch::{Dispatcher, Outcome, RelaySettings};
use crate::filter::Filters;
use crate::module::{ModuleKind, ModuleRegistry};
use crate::render::{RenderedMessage, Segment};
use crate::sink::{ChatLogger, DeliverySink};

/// One line of a replay stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Connect {
        id: AccountId,
        name: String,
        #[serde(default)]
        server: Option<String>,
        #[serde(default)]
        permissions: Vec<Permission>,
        #[serde(default)]
        channel: Option<ChannelType>,
    },
    Disconnect {
        id: AccountId,
    },
    Switch {
        id: AccountId,
        server: String,
    },
    Chat {
        id: AccountId,
        #[serde(default)]
        channel: Option<ChannelType>,
        message: String,
    },
    Private {
        id: AccountId,
        target: AccountId,
        message: String,
    },
    Alert {
        id: AccountId,
        message: String,
    },
    /// Change the account's preferred channel. `null` clears it.
    Channel {
        id: AccountId,
        channel: Option<ChannelType>,
    },
    Ignore {
        id: AccountId,
        target: AccountId,
    },
    Unignore {
        id: AccountId,
        target: AccountId,
    },
    Vanish {
        id: AccountId,
        vanished: bool,
    },
    /// Mute for `minutes`, or unmute when absent.
    Mute {
        id: AccountId,
        #[serde(default)]
        minutes: Option<i64>,
    },
    Spy {
        id: AccountId,
        #[serde(default)]
        social: Option<bool>,
        #[serde(default)]
        local: Option<bool>,
    },
    Module {
        name: ModuleKind,
        enabled: bool,
    },
}

#[derive(Serialize)]
struct DeliveryLine<'a> {
    to: AccountId,
    name: String,
    text: String,
    segments: &'a [Segment],
}

fn write_line<W: Write>(writer: &mut W, line: &DeliveryLine<'_>) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, line)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Writes each delivery as one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> DeliverySink for JsonLinesSink<W> {
    fn deliver(&self, recipient: &dyn Account, message: &RenderedMessage) {
        let line = DeliveryLine {
            to: recipient.id(),
            name: recipient.name(),
            text: message.plain_text(),
            segments: message.segments(),
        };

        let mut writer = self.writer.lock();
        if let Err(e) = write_line(&mut *writer, &line) {
            warn!(recipient = recipient.id(), "Failed to write delivery: {}", e);
        }
    }
}

/// Connected accounts plus the dispatcher that routes between them.
pub struct ReplaySession {
    directory: Arc<InMemoryDirectory>,
    dispatcher: Dispatcher,
}

impl ReplaySession {
    pub fn new(directory: Arc<InMemoryDirectory>, dispatcher: Dispatcher) -> Self {
        Self {
            directory,
            dispatcher,
        }
    }

    /// Wire an empty directory, the configured modules and a dispatcher.
    pub fn from_config(
        config: &Config,
        delivery: Arc<dyn DeliverySink>,
        chat_log: Arc<dyn ChatLogger>,
    ) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let modules = Arc::new(ModuleRegistry::from_config(
            &config.modules,
            &config.messages,
            Arc::new(Filters::new()),
            clock,
        ));
        let dispatcher = Dispatcher::new(
            Arc::clone(&directory) as Arc<dyn AccountDirectory>,
            delivery,
            modules,
            RelaySettings::from(config),
        )
        .with_chat_logger(chat_log);

        Self::new(directory, dispatcher)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn directory(&self) -> &Arc<InMemoryDirectory> {
        &self.directory
    }

    /// Parse and handle one line. Blank lines and `#` comments are skipped.
    pub fn handle_line(&self, line: &str) -> Result<Option<Outcome>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let event: ReplayEvent = serde_json::from_str(line).map_err(ReplayError::from)?;
        self.handle(event)
    }

    /// Apply one event. Events that send something return the dispatch outcome.
    pub fn handle(&self, event: ReplayEvent) -> Result<Option<Outcome>> {
        debug!(?event, "Replaying event");
        let outcome = match event {
            ReplayEvent::Connect {
                id,
                name,
                server,
                permissions,
                channel,
            } => {
                let mut account = PlayerAccount::new(id, name);
                if let Some(server) = server {
                    account = account.on_server(server);
                }
                for permission in permissions {
                    account = account.with_permission(permission);
                }
                if let Some(channel) = channel {
                    account = account.with_channel(channel);
                }
                self.directory.connect(account);
                info!(account = id, "Account connected");
                self.dispatcher.send_join_message(id)?
            }
            ReplayEvent::Disconnect { id } => {
                self.account(id)?;
                let outcome = self.dispatcher.send_leave_message(id)?;
                self.directory.disconnect(id);
                info!(account = id, "Account disconnected");
                outcome
            }
            ReplayEvent::Switch { id, server } => {
                let server = ServerName::new(server);
                self.account(id)?.set_server(Some(server.clone()));
                self.dispatcher.send_switch_message(id, server)?
            }
            ReplayEvent::Chat {
                id,
                channel,
                message,
            } => self.dispatcher.send_message(id, channel, &message)?,
            ReplayEvent::Private {
                id,
                target,
                message,
            } => self.dispatcher.send_private_message(id, target, &message)?,
            ReplayEvent::Alert { id, message } => self.dispatcher.send_alert(id, &message)?,
            ReplayEvent::Channel { id, channel } => {
                self.account(id)?.set_channel_type(channel);
                return Ok(None);
            }
            ReplayEvent::Ignore { id, target } => {
                self.account(id)?.ignore(target);
                return Ok(None);
            }
            ReplayEvent::Unignore { id, target } => {
                self.account(id)?.unignore(target);
                return Ok(None);
            }
            ReplayEvent::Vanish { id, vanished } => {
                self.account(id)?.set_vanished(vanished);
                return Ok(None);
            }
            ReplayEvent::Mute { id, minutes } => {
                let until = minutes.map(mute_deadline).transpose()?;
                self.account(id)?.mute_until(until);
                return Ok(None);
            }
            ReplayEvent::Spy { id, social, local } => {
                let account = self.account(id)?;
                if let Some(enabled) = social {
                    account.set_social_spy(enabled);
                }
                if let Some(enabled) = local {
                    account.set_local_spy(enabled);
                }
                return Ok(None);
            }
            ReplayEvent::Module { name, enabled } => {
                self.dispatcher.modules().set_enabled(name, enabled);
                return Ok(None);
            }
        };
        Ok(Some(outcome))
    }

    fn account(&self, id: AccountId) -> std::result::Result<Arc<PlayerAccount>, ReplayError> {
        self.directory
            .get(id)
            .ok_or(ReplayError::UnknownAccount { id })
    }
}

fn mute_deadline(minutes: i64) -> std::result::Result<DateTime<Utc>, ReplayError> {
    TimeDelta::try_minutes(minutes)
        .and_then(|duration| Utc::now().checked_add_signed(duration))
        .ok_or_else(|| ReplayError::InvalidEvent {
            message: format!("mute of {minutes} minutes is out of range"),
        })
}
