use crate::slot::SlotId;
use crate::tab::TabId;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// Default staleness timeout for abandoned lock records.
pub const DEFAULT_STALE_AFTER_SECONDS: i64 = 120;

/// Advisory ownership marker for a slot. Replace-only: a record is written
/// whole, never mutated in place, and at most one exists per slot key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub slot_id: SlotId,
    pub owner_tab: TabId,
    pub acquired_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        now - self.acquired_at > stale_after
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockStoreError {
    #[error("lock storage unavailable: {0}")]
    Unavailable(String),
}

/// One change to a slot's lock record; `record` is `None` after a removal.
#[derive(Debug, Clone)]
pub struct LockChange {
    pub slot_id: SlotId,
    pub record: Option<LockRecord>,
}

/// The shared storage area holding lock records, abstracted so the manager
/// can run against an in-process map or an external store. Every mutation
/// is broadcast to subscribers, which is how other tabs learn about holds
/// they did not take themselves.
#[async_trait]
pub trait LockStore: Send + Sync {
    async fn get(&self, slot_id: &SlotId) -> Result<Option<LockRecord>, LockStoreError>;

    /// Write the record for its slot, replacing any existing one.
    async fn set(&self, record: LockRecord) -> Result<(), LockStoreError>;

    async fn delete(&self, slot_id: &SlotId) -> Result<(), LockStoreError>;

    async fn scan(&self) -> Result<Vec<LockRecord>, LockStoreError>;

    fn subscribe(&self) -> broadcast::Receiver<LockChange>;
}

/// Outcome of an acquire attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "status")]
pub enum LockResult {
    Acquired,
    HeldByOther {
        owner_tab: TabId,
        acquired_at: DateTime<Utc>,
    },
}

/// Outcome of a release attempt. `NotOwner` leaves the record untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "status")]
pub enum ReleaseResult {
    Released,
    NotOwner,
    NotHeld,
}

/// A slot's lock state as seen from one tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "state")]
pub enum LockState {
    Free,
    HeldBySelf,
    HeldByOther {
        owner_tab: TabId,
        acquired_at: DateTime<Utc>,
    },
}

/// Best-effort mutual exclusion over slots within one shared storage area.
///
/// The check-then-write in `acquire` is not atomic against a concurrent
/// writer in another tab; the narrow race window is accepted because the
/// lock is advisory. Conflict arbitration happens when the booking row is
/// actually inserted, never here.
#[derive(Clone)]
pub struct SlotLockManager {
    store: Arc<dyn LockStore>,
    stale_after: Duration,
}

impl SlotLockManager {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self::with_stale_after(store, Duration::seconds(DEFAULT_STALE_AFTER_SECONDS))
    }

    pub fn with_stale_after(store: Arc<dyn LockStore>, stale_after: Duration) -> Self {
        Self { store, stale_after }
    }

    pub fn store(&self) -> &Arc<dyn LockStore> {
        &self.store
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Try to take the slot for `tab`. A live record held by another tab is
    /// never overwritten; a stale one is. Re-acquiring a slot the tab
    /// already holds refreshes the timestamp.
    pub async fn acquire(
        &self,
        slot_id: &SlotId,
        tab: &TabId,
    ) -> Result<LockResult, LockStoreError> {
        let now = Utc::now();
        if let Some(existing) = self.store.get(slot_id).await? {
            if existing.owner_tab != *tab && !existing.is_stale(now, self.stale_after) {
                return Ok(LockResult::HeldByOther {
                    owner_tab: existing.owner_tab,
                    acquired_at: existing.acquired_at,
                });
            }
        }
        self.store
            .set(LockRecord {
                slot_id: slot_id.clone(),
                owner_tab: tab.clone(),
                acquired_at: now,
            })
            .await?;
        Ok(LockResult::Acquired)
    }

    /// Remove the slot's record, but only on behalf of its owner.
    pub async fn release(
        &self,
        slot_id: &SlotId,
        tab: &TabId,
    ) -> Result<ReleaseResult, LockStoreError> {
        match self.store.get(slot_id).await? {
            None => Ok(ReleaseResult::NotHeld),
            Some(existing) if existing.owner_tab != *tab => Ok(ReleaseResult::NotOwner),
            Some(_) => {
                self.store.delete(slot_id).await?;
                Ok(ReleaseResult::Released)
            }
        }
    }

    /// Snapshot of the slot's state as seen from `tab`. Stale records read
    /// as free; they are physically removed by the next sweep or acquire.
    pub async fn state(&self, slot_id: &SlotId, tab: &TabId) -> Result<LockState, LockStoreError> {
        let now = Utc::now();
        Ok(match self.store.get(slot_id).await? {
            None => LockState::Free,
            Some(rec) if rec.is_stale(now, self.stale_after) => LockState::Free,
            Some(rec) if rec.owner_tab == *tab => LockState::HeldBySelf,
            Some(rec) => LockState::HeldByOther {
                owner_tab: rec.owner_tab,
                acquired_at: rec.acquired_at,
            },
        })
    }

    /// Subscribe to state changes of one slot, as seen from `tab`. Yields
    /// on every change of that slot's record, including changes made by
    /// other tabs.
    pub fn observe(&self, slot_id: &SlotId, tab: &TabId) -> LockWatch {
        LockWatch {
            slot_id: slot_id.clone(),
            tab: tab.clone(),
            rx: self.store.subscribe(),
        }
    }

    /// Remove every record older than the staleness timeout and return the
    /// count. A tab that crashed without releasing stops blocking its slots
    /// once this runs, in any surviving tab.
    pub async fn sweep_stale(&self, now: DateTime<Utc>) -> Result<usize, LockStoreError> {
        let mut removed = 0;
        for record in self.store.scan().await? {
            if record.is_stale(now, self.stale_after) {
                self.store.delete(&record.slot_id).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Swept {} stale slot locks", removed);
        }
        Ok(removed)
    }
}

/// Subscription handle produced by [`SlotLockManager::observe`].
pub struct LockWatch {
    slot_id: SlotId,
    tab: TabId,
    rx: broadcast::Receiver<LockChange>,
}

impl LockWatch {
    /// Wait for the next state change of the observed slot. Returns `None`
    /// once the store is gone.
    pub async fn next(&mut self) -> Option<LockState> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.slot_id == self.slot_id => {
                    return Some(match change.record {
                        None => LockState::Free,
                        Some(rec) if rec.owner_tab == self.tab => LockState::HeldBySelf,
                        Some(rec) => LockState::HeldByOther {
                            owner_tab: rec.owner_tab,
                            acquired_at: rec.acquired_at,
                        },
                    });
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Process-local lock store: a guarded map plus a change channel. One
/// instance is the analogue of one browser origin's shared storage.
pub struct MemoryLockStore {
    records: RwLock<HashMap<SlotId, LockRecord>>,
    changes: broadcast::Sender<LockChange>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(100);
        Self {
            records: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, slot_id: &SlotId, record: Option<LockRecord>) {
        // No receivers is fine; nobody is watching this slot yet.
        let _ = self.changes.send(LockChange {
            slot_id: slot_id.clone(),
            record,
        });
    }
}

impl Default for MemoryLockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn get(&self, slot_id: &SlotId) -> Result<Option<LockRecord>, LockStoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
        Ok(records.get(slot_id).cloned())
    }

    async fn set(&self, record: LockRecord) -> Result<(), LockStoreError> {
        let slot_id = record.slot_id.clone();
        {
            let mut records = self
                .records
                .write()
                .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
            records.insert(slot_id.clone(), record.clone());
        }
        self.notify(&slot_id, Some(record));
        Ok(())
    }

    async fn delete(&self, slot_id: &SlotId) -> Result<(), LockStoreError> {
        let removed = {
            let mut records = self
                .records
                .write()
                .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
            records.remove(slot_id)
        };
        if removed.is_some() {
            self.notify(slot_id, None);
        }
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<LockRecord>, LockStoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
        Ok(records.values().cloned().collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<LockChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SlotLockManager {
        SlotLockManager::new(Arc::new(MemoryLockStore::new()))
    }

    fn slot(key: &str) -> SlotId {
        SlotId::parse(key).unwrap()
    }

    #[tokio::test]
    async fn test_acquire_then_foreign_acquire_is_blocked() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00+02:00");
        let tab_a = TabId::new("tab-a");
        let tab_b = TabId::new("tab-b");

        assert_eq!(locks.acquire(&s, &tab_a).await.unwrap(), LockResult::Acquired);

        // Second tab sees the hold and never overwrites it
        match locks.acquire(&s, &tab_b).await.unwrap() {
            LockResult::HeldByOther { owner_tab, .. } => assert_eq!(owner_tab, tab_a),
            other => panic!("expected HeldByOther, got {:?}", other),
        }
        assert_eq!(
            locks.state(&s, &tab_a).await.unwrap(),
            LockState::HeldBySelf
        );
    }

    #[tokio::test]
    async fn test_reentrant_acquire_refreshes() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00Z");
        let tab = TabId::new("tab-a");

        locks.acquire(&s, &tab).await.unwrap();
        let first = locks.store().get(&s).await.unwrap().unwrap();

        // Re-opening the modal in the same tab re-acquires, not conflicts
        assert_eq!(locks.acquire(&s, &tab).await.unwrap(), LockResult::Acquired);
        let second = locks.store().get(&s).await.unwrap().unwrap();
        assert_eq!(second.owner_tab, tab);
        assert!(second.acquired_at >= first.acquired_at);
    }

    #[tokio::test]
    async fn test_release_by_non_owner_is_refused() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00Z");
        let tab_a = TabId::new("tab-a");
        let tab_b = TabId::new("tab-b");

        locks.acquire(&s, &tab_a).await.unwrap();
        assert_eq!(
            locks.release(&s, &tab_b).await.unwrap(),
            ReleaseResult::NotOwner
        );

        // Record untouched, still owned by A
        let record = locks.store().get(&s).await.unwrap().unwrap();
        assert_eq!(record.owner_tab, tab_a);
    }

    #[tokio::test]
    async fn test_release_then_foreign_acquire_succeeds() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00+02:00");
        let tab_a = TabId::new("tab-a");
        let tab_b = TabId::new("tab-b");

        locks.acquire(&s, &tab_a).await.unwrap();
        assert_eq!(
            locks.state(&s, &tab_b).await.unwrap(),
            LockState::HeldByOther {
                owner_tab: tab_a.clone(),
                acquired_at: locks.store().get(&s).await.unwrap().unwrap().acquired_at,
            }
        );

        assert_eq!(
            locks.release(&s, &tab_a).await.unwrap(),
            ReleaseResult::Released
        );
        assert_eq!(locks.acquire(&s, &tab_b).await.unwrap(), LockResult::Acquired);
    }

    #[tokio::test]
    async fn test_release_unheld_slot() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00Z");
        assert_eq!(
            locks.release(&s, &TabId::new("tab-a")).await.unwrap(),
            ReleaseResult::NotHeld
        );
    }

    #[tokio::test]
    async fn test_stale_record_is_swept_and_reacquirable() {
        let store = Arc::new(MemoryLockStore::new());
        let locks = SlotLockManager::with_stale_after(store.clone(), Duration::seconds(120));
        let s = slot("2024-06-01T10:00:00Z");
        let tab_a = TabId::new("tab-a");
        let tab_b = TabId::new("tab-b");

        // Tab A takes the slot, then disappears without releasing.
        locks.acquire(&s, &tab_a).await.unwrap();
        let mut abandoned = store.get(&s).await.unwrap().unwrap();
        abandoned.acquired_at = Utc::now() - Duration::seconds(121);
        store.set(abandoned).await.unwrap();

        let removed = locks.sweep_stale(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(locks.acquire(&s, &tab_b).await.unwrap(), LockResult::Acquired);
    }

    #[tokio::test]
    async fn test_acquire_steals_stale_record_without_sweep() {
        let store = Arc::new(MemoryLockStore::new());
        let locks = SlotLockManager::with_stale_after(store.clone(), Duration::seconds(120));
        let s = slot("2024-06-01T10:00:00Z");

        locks.acquire(&s, &TabId::new("tab-a")).await.unwrap();
        let mut abandoned = store.get(&s).await.unwrap().unwrap();
        abandoned.acquired_at = Utc::now() - Duration::seconds(300);
        store.set(abandoned).await.unwrap();

        // No manual sweep needed; acquire treats the stale record as free
        let tab_b = TabId::new("tab-b");
        assert_eq!(locks.acquire(&s, &tab_b).await.unwrap(), LockResult::Acquired);
        assert_eq!(
            store.get(&s).await.unwrap().unwrap().owner_tab,
            tab_b
        );
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_records() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00Z");
        locks.acquire(&s, &TabId::new("tab-a")).await.unwrap();

        assert_eq!(locks.sweep_stale(Utc::now()).await.unwrap(), 0);
        assert!(locks.store().get(&s).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_observe_sees_foreign_changes() {
        let locks = manager();
        let s = slot("2024-06-01T10:00:00+02:00");
        let tab_a = TabId::new("tab-a");
        let tab_b = TabId::new("tab-b");

        let mut watch = locks.observe(&s, &tab_b);

        locks.acquire(&s, &tab_a).await.unwrap();
        match watch.next().await.unwrap() {
            LockState::HeldByOther { owner_tab, .. } => assert_eq!(owner_tab, tab_a),
            other => panic!("expected HeldByOther, got {:?}", other),
        }

        locks.release(&s, &tab_a).await.unwrap();
        assert_eq!(watch.next().await.unwrap(), LockState::Free);

        locks.acquire(&s, &tab_b).await.unwrap();
        assert_eq!(watch.next().await.unwrap(), LockState::HeldBySelf);
    }

    #[tokio::test]
    async fn test_observe_ignores_other_slots() {
        let locks = manager();
        let watched = slot("2024-06-01T10:00:00Z");
        let other = slot("2024-06-01T11:30:00Z");
        let tab = TabId::new("tab-a");

        let mut watch = locks.observe(&watched, &TabId::new("tab-b"));
        locks.acquire(&other, &tab).await.unwrap();
        locks.acquire(&watched, &tab).await.unwrap();

        // The change for `other` is skipped; first yield is for `watched`
        match watch.next().await.unwrap() {
            LockState::HeldByOther { owner_tab, .. } => assert_eq!(owner_tab, tab),
            state => panic!("expected HeldByOther, got {:?}", state),
        }
    }

    #[tokio::test]
    async fn test_at_most_one_record_per_slot() {
        let store = Arc::new(MemoryLockStore::new());
        let locks = SlotLockManager::new(store.clone());
        let s = slot("2024-06-01T10:00:00Z");

        locks.acquire(&s, &TabId::new("tab-a")).await.unwrap();
        let _ = locks.acquire(&s, &TabId::new("tab-b")).await.unwrap();
        locks.acquire(&s, &TabId::new("tab-a")).await.unwrap();

        let records: Vec<_> = store
            .scan()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.slot_id == s)
            .collect();
        assert_eq!(records.len(), 1);
    }
}
