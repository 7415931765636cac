//! Adapter turning a plain text transformation into a pre-parse filter.

use crate::account::Account;
use crate::common::FilterResult;

use super::PreParseFilter;

/// Pre-parse filter that rewrites text and never blocks.
pub struct FnFilter<F> {
    transform: F,
    priority: i32,
}

impl<F> FnFilter<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(transform: F) -> Self {
        Self::with_priority(transform, 0)
    }

    pub fn with_priority(transform: F, priority: i32) -> Self {
        Self {
            transform,
            priority,
        }
    }
}

impl<F> PreParseFilter for FnFilter<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn apply(&self, _sender: &dyn Account, message: String) -> FilterResult<String> {
        Ok((self.transform)(&message))
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
