use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::provider::RouteResult;

/// Directional route cache key: `A -> B` and `B -> A` are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteKey {
    pub from_id: String,
    pub to_id: String,
}

impl RouteKey {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from_id, self.to_id)
    }
}

/// Session-lifetime cache of resolved routes.
///
/// Explicitly constructed and passed in (never ambient module state) so
/// every test can own an isolated instance. Entries persist until an
/// explicit `clear`; there is no TTL and no eviction. Results for a fixed
/// key are assumed referentially stable, so concurrent writes for the same
/// key are last-write-wins and the content is identical either way.
/// Failed resolutions are never inserted.
#[derive(Debug, Default)]
pub struct RouteCache {
    entries: Mutex<BTreeMap<RouteKey, RouteResult>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RouteKey) -> Option<RouteResult> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: RouteKey, result: RouteResult) {
        self.entries.lock().insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Empties every entry unconditionally. Used for test isolation and
    /// manual refresh, never on an automatic schedule.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
