use crate::lock::{LockChange, LockRecord, LockStore, LockStoreError};
use crate::slot::SlotId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CircuitState {
    Closed,   // Normal operation
    Open,     // Storage failing, answering degraded
    HalfOpen, // Probing whether storage is back
}

/// Fail-open wrapper around a [`LockStore`].
///
/// The advisory lock is a UX courtesy: when its storage misbehaves, booking
/// must proceed rather than block. After `failure_threshold` consecutive
/// failures this wrapper trips and answers as an empty, accept-everything
/// store (every acquire grants, no cross-tab visibility) until
/// `reset_timeout` passes, after which one probe call is let through.
pub struct FailOpen<S> {
    inner: S,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    last_failure: RwLock<Option<Instant>>,
}

impl<S: LockStore> FailOpen<S> {
    pub fn new(inner: S, failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            inner,
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold,
            reset_timeout,
            last_failure: RwLock::new(None),
        }
    }

    async fn check(&self) -> bool {
        let state = *self.state.read().await;
        if state == CircuitState::Closed {
            return true;
        }

        if state == CircuitState::Open {
            let last_fail = *self.last_failure.read().await;
            if let Some(instant) = last_fail {
                if instant.elapsed() > self.reset_timeout {
                    let mut s = self.state.write().await;
                    *s = CircuitState::HalfOpen;
                    tracing::info!("Lock store probe: moving to Half-Open");
                    return true;
                }
            }
            return false;
        }

        // Half-Open allows one request through
        true
    }

    async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            *state = CircuitState::Closed;
            self.failure_count.store(0, Ordering::SeqCst);
            tracing::info!("Lock store recovered, advisory holds visible again");
        } else if *state == CircuitState::Closed {
            self.failure_count.store(0, Ordering::SeqCst);
        }
    }

    async fn record_failure(&self, err: &LockStoreError) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            let mut last = self.last_failure.write().await;
            *last = Some(Instant::now());
            tracing::warn!(
                "Lock store failing ({} consecutive): {}. Advisory holds degraded to fail-open",
                count,
                err
            );
        }
    }

}

#[async_trait]
impl<S: LockStore> LockStore for FailOpen<S> {
    async fn get(&self, slot_id: &SlotId) -> Result<Option<LockRecord>, LockStoreError> {
        if !self.check().await {
            return Ok(None);
        }
        match self.inner.get(slot_id).await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(e) => {
                self.record_failure(&e).await;
                Ok(None)
            }
        }
    }

    async fn set(&self, record: LockRecord) -> Result<(), LockStoreError> {
        if !self.check().await {
            return Ok(());
        }
        match self.inner.set(record).await {
            Ok(()) => {
                self.record_success().await;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e).await;
                Ok(())
            }
        }
    }

    async fn delete(&self, slot_id: &SlotId) -> Result<(), LockStoreError> {
        if !self.check().await {
            return Ok(());
        }
        match self.inner.delete(slot_id).await {
            Ok(()) => {
                self.record_success().await;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e).await;
                Ok(())
            }
        }
    }

    async fn scan(&self) -> Result<Vec<LockRecord>, LockStoreError> {
        if !self.check().await {
            return Ok(Vec::new());
        }
        match self.inner.scan().await {
            Ok(records) => {
                self.record_success().await;
                Ok(records)
            }
            Err(e) => {
                self.record_failure(&e).await;
                Ok(Vec::new())
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<LockChange> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockResult, MemoryLockStore, SlotLockManager};
    use crate::tab::TabId;
    use std::sync::Arc;

    /// Store that always errors, standing in for disabled storage.
    struct BrokenStore {
        changes: broadcast::Sender<LockChange>,
    }

    impl BrokenStore {
        fn new() -> Self {
            let (changes, _) = broadcast::channel(1);
            Self { changes }
        }
    }

    #[async_trait]
    impl LockStore for BrokenStore {
        async fn get(&self, _slot_id: &SlotId) -> Result<Option<LockRecord>, LockStoreError> {
            Err(LockStoreError::Unavailable("quota exceeded".into()))
        }
        async fn set(&self, _record: LockRecord) -> Result<(), LockStoreError> {
            Err(LockStoreError::Unavailable("quota exceeded".into()))
        }
        async fn delete(&self, _slot_id: &SlotId) -> Result<(), LockStoreError> {
            Err(LockStoreError::Unavailable("quota exceeded".into()))
        }
        async fn scan(&self) -> Result<Vec<LockRecord>, LockStoreError> {
            Err(LockStoreError::Unavailable("quota exceeded".into()))
        }
        fn subscribe(&self) -> broadcast::Receiver<LockChange> {
            self.changes.subscribe()
        }
    }

    #[tokio::test]
    async fn test_broken_storage_grants_every_acquire() {
        let store = FailOpen::new(BrokenStore::new(), 3, Duration::from_secs(30));
        let locks = SlotLockManager::new(Arc::new(store));
        let s = crate::slot::SlotId::parse("2024-06-01T10:00:00Z").unwrap();

        // Two different tabs both get the slot: no visibility, no blocking
        for tab in ["tab-a", "tab-b"] {
            let result = locks.acquire(&s, &TabId::new(tab)).await.unwrap();
            assert_eq!(result, LockResult::Acquired);
        }
    }

    #[tokio::test]
    async fn test_healthy_storage_passes_through() {
        let store = FailOpen::new(MemoryLockStore::new(), 3, Duration::from_secs(30));
        let locks = SlotLockManager::new(Arc::new(store));
        let s = crate::slot::SlotId::parse("2024-06-01T10:00:00Z").unwrap();

        assert_eq!(
            locks.acquire(&s, &TabId::new("tab-a")).await.unwrap(),
            LockResult::Acquired
        );
        match locks.acquire(&s, &TabId::new("tab-b")).await.unwrap() {
            LockResult::HeldByOther { owner_tab, .. } => {
                assert_eq!(owner_tab, TabId::new("tab-a"))
            }
            other => panic!("expected HeldByOther, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_circuit_stops_hammering_broken_store() {
        let store = FailOpen::new(BrokenStore::new(), 2, Duration::from_secs(60));
        let s = crate::slot::SlotId::parse("2024-06-01T10:00:00Z").unwrap();

        // Trip the breaker
        let _ = store.get(&s).await.unwrap();
        let _ = store.get(&s).await.unwrap();

        // Tripped: calls answer degraded without touching the inner store
        assert_eq!(*store.state.read().await, CircuitState::Open);
        assert_eq!(store.get(&s).await.unwrap(), None);
        assert_eq!(store.scan().await.unwrap(), Vec::new());
    }
}
