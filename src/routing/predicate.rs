//! Composable predicates over accounts.

use std::fmt;
use std::sync::Arc;

use crate::account::Account;

type PredicateFn = dyn Fn(&dyn Account) -> bool + Send + Sync;

/// Decides whether an account receives a message.
#[derive(Clone)]
pub struct AccountPredicate(Arc<PredicateFn>);

impl AccountPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&dyn Account) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn always() -> Self {
        Self::new(|_| true)
    }

    pub fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn test(&self, account: &dyn Account) -> bool {
        (self.0)(account)
    }

    pub fn and(self, other: AccountPredicate) -> Self {
        Self::new(move |account| self.test(account) && other.test(account))
    }

    pub fn or(self, other: AccountPredicate) -> Self {
        Self::new(move |account| self.test(account) || other.test(account))
    }

    pub fn negate(self) -> Self {
        Self::new(move |account| !self.test(account))
    }

    /// Conjunction of all predicates. Empty input accepts everyone.
    pub fn all(predicates: impl IntoIterator<Item = AccountPredicate>) -> Self {
        predicates
            .into_iter()
            .reduce(AccountPredicate::and)
            .unwrap_or_else(Self::always)
    }
}

impl fmt::Debug for AccountPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccountPredicate")
    }
}
