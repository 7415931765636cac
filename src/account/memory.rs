//! In-memory accounts, used by the replay binary and tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{Account, AccountDirectory, AccountRef};
use crate::channel::ChannelType;
use crate::common::{AccountId, Permission, ServerName};

#[derive(Debug)]
struct PlayerState {
    server: Option<ServerName>,
    channel: Option<ChannelType>,
    vanished: bool,
    messenger: bool,
    social_spy: bool,
    local_spy: bool,
    muted_until: Option<DateTime<Utc>>,
    ignored: HashSet<AccountId>,
    permissions: HashSet<Permission>,
}

/// Account whose state lives entirely in memory.
#[derive(Debug)]
pub struct PlayerAccount {
    id: AccountId,
    name: String,
    state: RwLock<PlayerState>,
}

impl PlayerAccount {
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: RwLock::new(PlayerState {
                server: None,
                channel: None,
                vanished: false,
                messenger: true,
                social_spy: false,
                local_spy: false,
                muted_until: None,
                ignored: HashSet::new(),
                permissions: HashSet::new(),
            }),
        }
    }

    pub fn on_server(self, server: impl Into<ServerName>) -> Self {
        self.state.write().server = Some(server.into());
        self
    }

    pub fn with_permission(self, permission: Permission) -> Self {
        self.grant(permission);
        self
    }

    pub fn with_channel(self, channel: ChannelType) -> Self {
        self.set_channel_type(Some(channel));
        self
    }

    pub fn set_server(&self, server: Option<ServerName>) {
        self.state.write().server = server;
    }

    pub fn set_channel_type(&self, channel: Option<ChannelType>) {
        self.state.write().channel = channel;
    }

    pub fn set_vanished(&self, vanished: bool) {
        self.state.write().vanished = vanished;
    }

    pub fn set_messenger(&self, enabled: bool) {
        self.state.write().messenger = enabled;
    }

    pub fn set_social_spy(&self, enabled: bool) {
        self.state.write().social_spy = enabled;
    }

    pub fn set_local_spy(&self, enabled: bool) {
        self.state.write().local_spy = enabled;
    }

    pub fn mute_until(&self, until: Option<DateTime<Utc>>) {
        self.state.write().muted_until = until;
    }

    pub fn ignore(&self, other: AccountId) {
        self.state.write().ignored.insert(other);
    }

    pub fn unignore(&self, other: AccountId) {
        self.state.write().ignored.remove(&other);
    }

    pub fn grant(&self, permission: Permission) {
        self.state.write().permissions.insert(permission);
    }

    pub fn revoke(&self, permission: Permission) {
        self.state.write().permissions.remove(&permission);
    }
}

impl Account for PlayerAccount {
    fn id(&self) -> AccountId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn server(&self) -> Option<ServerName> {
        self.state.read().server.clone()
    }

    fn channel_type(&self) -> Option<ChannelType> {
        self.state.read().channel
    }

    fn is_vanished(&self) -> bool {
        self.state.read().vanished
    }

    fn has_permission(&self, permission: Permission) -> bool {
        self.state.read().permissions.contains(&permission)
    }

    fn has_ignored(&self, other: AccountId) -> bool {
        self.state.read().ignored.contains(&other)
    }

    fn messenger_enabled(&self) -> bool {
        self.state.read().messenger
    }

    fn social_spy_enabled(&self) -> bool {
        self.state.read().social_spy
    }

    fn local_spy_enabled(&self) -> bool {
        self.state.read().local_spy
    }

    fn is_muted(&self) -> bool {
        self.state
            .read()
            .muted_until
            .is_some_and(|until| until > Utc::now())
    }
}

/// Directory of in-memory accounts, iterated in id order.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<BTreeMap<AccountId, Arc<PlayerAccount>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account, replacing any previous one with the same id.
    pub fn connect(&self, account: PlayerAccount) -> Arc<PlayerAccount> {
        let account = Arc::new(account);
        self.accounts.write().insert(account.id, Arc::clone(&account));
        account
    }

    pub fn disconnect(&self, id: AccountId) -> Option<Arc<PlayerAccount>> {
        self.accounts.write().remove(&id)
    }

    /// Concrete handle for mutating account state.
    pub fn get(&self, id: AccountId) -> Option<Arc<PlayerAccount>> {
        self.accounts.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

impl AccountDirectory for InMemoryDirectory {
    fn resolve(&self, id: AccountId) -> Option<AccountRef> {
        self.get(id).map(|account| account as AccountRef)
    }

    fn connected_accounts(&self) -> Vec<AccountRef> {
        self.accounts
            .read()
            .values()
            .map(|account| Arc::clone(account) as AccountRef)
            .collect()
    }
}
