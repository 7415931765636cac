//! Recipient selection.
//!
//! Builders for the predicates that decide who receives a message. Each
//! channel starts from one of these and the dispatcher narrows it further.

mod predicate;

pub use predicate::AccountPredicate;

use crate::account::{Account, AccountRef};
use crate::common::{AccountId, Permission, ServerName};

/// Groups of servers whose local chat is shared.
pub type ServerGroups = Vec<Vec<ServerName>>;

/// Accounts on the given server. No server matches nobody.
pub fn server(server: Option<&ServerName>) -> AccountPredicate {
    match server.cloned() {
        Some(server) => AccountPredicate::new(move |account| {
            account.server().as_ref() == Some(&server)
        }),
        None => AccountPredicate::never(),
    }
}

/// Accounts allowed to see global chat. Without a server list, everyone.
pub fn global(server_list: Option<&[ServerName]>) -> AccountPredicate {
    match server_list {
        Some(list) => {
            let list = list.to_vec();
            AccountPredicate::new(move |account| {
                account
                    .server()
                    .is_some_and(|server| list.contains(&server))
            })
        }
        None => AccountPredicate::always(),
    }
}

/// Group containing `server`, if any. The first matching group wins.
pub fn group_of<'a>(groups: &'a [Vec<ServerName>], server: &ServerName) -> Option<&'a [ServerName]> {
    groups
        .iter()
        .find(|group| group.contains(server))
        .map(Vec::as_slice)
}

/// Accounts on other servers sharing a group with `source`.
///
/// The source server itself is excluded; it is reached through local chat.
pub fn multicast(groups: &[Vec<ServerName>], source: Option<&ServerName>) -> AccountPredicate {
    let Some(source) = source.cloned() else {
        return AccountPredicate::never();
    };
    let groups = groups.to_vec();
    AccountPredicate::new(move |account| {
        let Some(server) = account.server() else {
            return false;
        };
        if server == source {
            return false;
        }
        group_of(&groups, &server).is_some_and(|group| group.contains(&source))
    })
}

/// The source server plus every server sharing a group with it.
pub fn inclusive_multicast(
    groups: &[Vec<ServerName>],
    source: Option<&ServerName>,
) -> AccountPredicate {
    server(source).or(multicast(groups, source))
}

pub fn permission(permission: Permission) -> AccountPredicate {
    AccountPredicate::new(move |account| account.has_permission(permission))
}

/// Accounts that do not ignore `sender`. Senders with the bypass permission reach everyone.
pub fn not_ignored(sender: &dyn Account) -> AccountPredicate {
    if sender.has_permission(Permission::BypassIgnore) {
        return AccountPredicate::always();
    }
    let sender = sender.id();
    AccountPredicate::new(move |account| !account.has_ignored(sender))
}

pub fn social_spy() -> AccountPredicate {
    AccountPredicate::new(|account| account.is_social_spy_active())
}

pub fn local_spy() -> AccountPredicate {
    AccountPredicate::new(|account| account.is_local_spy_active())
}

pub fn account(id: AccountId) -> AccountPredicate {
    AccountPredicate::new(move |account| account.id() == id)
}

pub fn not_account(id: AccountId) -> AccountPredicate {
    account(id).negate()
}

/// Accounts allowed to see a vanished sender.
pub fn vanish_visible() -> AccountPredicate {
    permission(Permission::VanishView)
}

/// Filter `accounts` down to those accepted by `predicate`.
pub fn select(accounts: Vec<AccountRef>, predicate: &AccountPredicate) -> Vec<AccountRef> {
    accounts
        .into_iter()
        .filter(|account| predicate.test(account.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::PlayerAccount;

    fn on(id: u64, server: &str) -> PlayerAccount {
        PlayerAccount::new(id, format!("p{id}")).on_server(server)
    }

    fn groups() -> ServerGroups {
        vec![
            vec!["a".into(), "b".into()],
            vec!["c".into(), "d".into()],
        ]
    }

    #[test]
    fn test_server_predicate() {
        let lobby: ServerName = "lobby".into();
        assert!(server(Some(&lobby)).test(&on(1, "lobby")));
        assert!(!server(Some(&lobby)).test(&on(1, "survival")));
        assert!(!server(None).test(&on(1, "lobby")));
        assert!(!server(Some(&lobby)).test(&PlayerAccount::new(1, "nowhere")));
    }

    #[test]
    fn test_global_server_list() {
        let list: Vec<ServerName> = vec!["a".into(), "b".into()];
        assert!(global(Some(list.as_slice())).test(&on(1, "a")));
        assert!(!global(Some(list.as_slice())).test(&on(1, "c")));
        assert!(!global(Some(list.as_slice())).test(&PlayerAccount::new(1, "nowhere")));
        assert!(global(None).test(&on(1, "c")));
    }

    #[test]
    fn test_multicast_reaches_group_peers_only() {
        let groups = groups();
        let source: ServerName = "a".into();
        let predicate = multicast(&groups, Some(&source));
        assert!(predicate.test(&on(1, "b")));
        assert!(!predicate.test(&on(2, "a")));
        assert!(!predicate.test(&on(3, "c")));
        assert!(!predicate.test(&PlayerAccount::new(4, "nowhere")));
    }

    #[test]
    fn test_multicast_ungrouped_source() {
        let groups = groups();
        let source: ServerName = "e".into();
        let predicate = multicast(&groups, Some(&source));
        for server in ["a", "b", "c", "d", "e"] {
            assert!(!predicate.test(&on(1, server)));
        }
        assert!(!multicast(&groups, None).test(&on(1, "a")));
    }

    #[test]
    fn test_multicast_first_group_wins() {
        let groups: ServerGroups = vec![
            vec!["a".into(), "b".into()],
            vec!["b".into(), "c".into()],
        ];
        let source: ServerName = "c".into();
        assert!(!multicast(&groups, Some(&source)).test(&on(1, "b")));
    }

    #[test]
    fn test_inclusive_multicast() {
        let groups = groups();
        let source: ServerName = "a".into();
        let predicate = inclusive_multicast(&groups, Some(&source));
        assert!(predicate.test(&on(1, "a")));
        assert!(predicate.test(&on(2, "b")));
        assert!(!predicate.test(&on(3, "c")));
    }

    #[test]
    fn test_not_ignored() {
        let sender = PlayerAccount::new(1, "alice");
        let ignorer = PlayerAccount::new(2, "bob");
        ignorer.ignore(1);
        let other = PlayerAccount::new(3, "carol");

        assert!(!not_ignored(&sender).test(&ignorer));
        assert!(not_ignored(&sender).test(&other));

        sender.grant(Permission::BypassIgnore);
        assert!(not_ignored(&sender).test(&ignorer));
    }

    #[test]
    fn test_spy_predicates_need_permission() {
        let spy = PlayerAccount::new(1, "spy");
        spy.set_social_spy(true);
        spy.set_local_spy(true);
        assert!(!social_spy().test(&spy));
        assert!(!local_spy().test(&spy));

        spy.grant(Permission::SocialSpy);
        spy.grant(Permission::LocalSpy);
        assert!(social_spy().test(&spy));
        assert!(local_spy().test(&spy));
    }

    #[test]
    fn test_account_predicates() {
        let alice = PlayerAccount::new(1, "alice");
        assert!(account(1).test(&alice));
        assert!(!not_account(1).test(&alice));
    }
}
