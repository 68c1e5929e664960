use crate::repository::BookingRepoError;
use padup_core::lock::SlotLockManager;
use padup_core::slot::SlotId;
use padup_core::tab::TabId;
use tracing::warn;

/// What the caller should surface after the authoritative booking write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Insert succeeded. The advisory hold is released; the grid now shows
    /// the slot as booked from the bookings table itself.
    Confirmed,

    /// The backend refused: another booking got the slot first. The hold is
    /// released so the grid stops showing a stale "held" state, and the
    /// backend's reason is what the user sees.
    SlotTaken,

    /// Transient storage failure. The hold is kept so the player can retry
    /// without losing their place in the queue of watchers.
    Retry(String),
}

/// Align advisory lock state with the authoritative outcome of a booking
/// insert. The database decision is never second-guessed here; the only
/// job is to stop advertising a hold that no longer means anything.
pub async fn reconcile_commit(
    locks: &SlotLockManager,
    slot_id: &SlotId,
    tab: &TabId,
    result: Result<(), BookingRepoError>,
) -> CommitOutcome {
    match result {
        Ok(()) => {
            release_quietly(locks, slot_id, tab).await;
            CommitOutcome::Confirmed
        }
        Err(BookingRepoError::SlotTaken) => {
            release_quietly(locks, slot_id, tab).await;
            CommitOutcome::SlotTaken
        }
        Err(e) => CommitOutcome::Retry(e.to_string()),
    }
}

async fn release_quietly(locks: &SlotLockManager, slot_id: &SlotId, tab: &TabId) {
    if let Err(e) = locks.release(slot_id, tab).await {
        // Advisory only; the sweep will reclaim it eventually
        warn!("Could not release hold on {} after commit: {}", slot_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padup_core::lock::{LockResult, MemoryLockStore};
    use std::sync::Arc;

    fn setup() -> (SlotLockManager, SlotId, TabId) {
        let locks = SlotLockManager::new(Arc::new(MemoryLockStore::new()));
        let slot = SlotId::parse("2024-06-01T10:00:00Z").unwrap();
        let tab = TabId::new("tab-a");
        (locks, slot, tab)
    }

    #[tokio::test]
    async fn test_confirmed_booking_releases_hold() {
        let (locks, slot, tab) = setup();
        locks.acquire(&slot, &tab).await.unwrap();

        let outcome = reconcile_commit(&locks, &slot, &tab, Ok(())).await;
        assert_eq!(outcome, CommitOutcome::Confirmed);
        assert!(locks.store().get(&slot).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conflict_releases_hold_and_surfaces_reason() {
        let (locks, slot, tab) = setup();
        locks.acquire(&slot, &tab).await.unwrap();

        let outcome =
            reconcile_commit(&locks, &slot, &tab, Err(BookingRepoError::SlotTaken)).await;
        assert_eq!(outcome, CommitOutcome::SlotTaken);

        // Hold gone: the losing tab's grid flips to Booked, not Held
        assert!(locks.store().get(&slot).await.unwrap().is_none());
        let other = TabId::new("tab-b");
        assert_eq!(
            locks.acquire(&slot, &other).await.unwrap(),
            LockResult::Acquired
        );
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_hold() {
        let (locks, slot, tab) = setup();
        locks.acquire(&slot, &tab).await.unwrap();

        let err = BookingRepoError::Storage("connection reset".into());
        let outcome = reconcile_commit(&locks, &slot, &tab, Err(err)).await;
        assert!(matches!(outcome, CommitOutcome::Retry(_)));
        assert!(locks.store().get(&slot).await.unwrap().is_some());
    }
}
