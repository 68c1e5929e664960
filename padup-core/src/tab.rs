use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// Identity of one browsing context (a single tab in the web client).
///
/// Lock ownership is compared against this value, so it must stay the same
/// for the lifetime of the tab's session and differ between tabs of the
/// same player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(raw: impl Into<String>) -> TabId {
        TabId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage scoped to a single tab session. Not shared across tabs.
pub trait TabStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, id: &str);
}

/// Return the tab's identity, generating and persisting one on first use.
/// Subsequent calls against the same store return the same identity.
pub fn provision(store: &dyn TabStore) -> TabId {
    if let Some(existing) = store.load() {
        return TabId(existing);
    }
    let id = format!("tab-{}", Uuid::new_v4());
    store.store(&id);
    TabId(id)
}

/// In-memory tab-session store, one per connected session.
#[derive(Default)]
pub struct MemoryTabStore {
    cell: Mutex<Option<String>>,
}

impl MemoryTabStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabStore for MemoryTabStore {
    fn load(&self) -> Option<String> {
        self.cell.lock().expect("tab store poisoned").clone()
    }

    fn store(&self, id: &str) {
        *self.cell.lock().expect("tab store poisoned") = Some(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_is_idempotent_per_store() {
        let store = MemoryTabStore::new();

        let first = provision(&store);
        let second = provision(&store);
        assert_eq!(first, second);
    }

    #[test]
    fn test_separate_stores_get_separate_identities() {
        let a = provision(&MemoryTabStore::new());
        let b = provision(&MemoryTabStore::new());
        assert_ne!(a, b);
    }
}
