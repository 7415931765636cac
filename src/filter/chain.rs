//! Priority-ordered, copy-on-write filter registry.

use std::sync::Arc;

use parking_lot::RwLock;

/// A registered filter.
pub struct Entry<F: ?Sized> {
    pub key: String,
    pub priority: i32,
    pub filter: Arc<F>,
}

impl<F: ?Sized> Clone for Entry<F> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            priority: self.priority,
            filter: Arc::clone(&self.filter),
        }
    }
}

/// Filters keyed by name, kept sorted by priority.
///
/// Writers build a new sorted list and swap it in. A fold works on the
/// snapshot it started with, so concurrent changes only affect later folds.
pub struct FilterChain<F: ?Sized> {
    entries: RwLock<Arc<[Entry<F>]>>,
}

impl<F: ?Sized> Default for FilterChain<F> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Arc::from(Vec::new())),
        }
    }
}

impl<F: ?Sized> FilterChain<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the filter registered under `key`.
    pub fn insert(&self, key: &str, priority: i32, filter: Arc<F>) {
        let mut entries = self.entries.write();
        let mut next: Vec<Entry<F>> = entries
            .iter()
            .filter(|entry| entry.key != key)
            .cloned()
            .collect();
        next.push(Entry {
            key: key.to_string(),
            priority,
            filter,
        });
        // Stable sort keeps insertion order among equal priorities.
        next.sort_by_key(|entry| entry.priority);
        *entries = Arc::from(next);
    }

    /// Remove the filter under `key`. Returns whether one was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        if !entries.iter().any(|entry| entry.key == key) {
            return false;
        }
        let next: Vec<Entry<F>> = entries
            .iter()
            .filter(|entry| entry.key != key)
            .cloned()
            .collect();
        *entries = Arc::from(next);
        true
    }

    pub fn snapshot(&self) -> Arc<[Entry<F>]> {
        Arc::clone(&self.entries.read())
    }

    pub fn keys(&self) -> Vec<String> {
        self.snapshot().iter().map(|entry| entry.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
