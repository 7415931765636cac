//! Connected accounts as seen by the relay.
//!
//! The host application owns accounts. The relay only reads them through
//! [`Account`] and enumerates them through [`AccountDirectory`].

mod memory;

pub use memory::{InMemoryDirectory, PlayerAccount};

use std::fmt;
use std::sync::Arc;

use crate::channel::ChannelType;
use crate::common::{AccountId, Permission, ServerName};

/// Read-only view of a connected account.
pub trait Account: Send + Sync + fmt::Debug {
    fn id(&self) -> AccountId;

    fn name(&self) -> String;

    /// Server the account is currently connected to.
    fn server(&self) -> Option<ServerName>;

    /// Channel chosen by the account for messages sent without one.
    fn channel_type(&self) -> Option<ChannelType>;

    fn is_vanished(&self) -> bool;

    fn has_permission(&self, permission: Permission) -> bool;

    /// Whether this account ignores messages from `other`.
    fn has_ignored(&self, other: AccountId) -> bool;

    /// Whether the account accepts private messages.
    fn messenger_enabled(&self) -> bool;

    /// Raw social spy toggle. See [`Account::is_social_spy_active`].
    fn social_spy_enabled(&self) -> bool;

    /// Raw local spy toggle. See [`Account::is_local_spy_active`].
    fn local_spy_enabled(&self) -> bool;

    fn is_muted(&self) -> bool;

    /// Social spy only counts while the account still holds the permission for it.
    fn is_social_spy_active(&self) -> bool {
        self.social_spy_enabled() && self.has_permission(Permission::SocialSpy)
    }

    fn is_local_spy_active(&self) -> bool {
        self.local_spy_enabled() && self.has_permission(Permission::LocalSpy)
    }
}

pub type AccountRef = Arc<dyn Account>;

/// Lookup of accounts by id and enumeration of everyone connected.
pub trait AccountDirectory: Send + Sync {
    fn resolve(&self, id: AccountId) -> Option<AccountRef>;

    fn connected_accounts(&self) -> Vec<AccountRef>;
}
