use crate::redis_repo::RedisClient;
use async_trait::async_trait;
use padup_core::lock::{LockChange, LockRecord, LockStore, LockStoreError};
use padup_core::slot::SlotId;
use tokio::sync::broadcast;
use tracing::warn;

fn unavailable(e: redis::RedisError) -> LockStoreError {
    LockStoreError::Unavailable(e.to_string())
}

/// Redis-backed storage area for advisory slot holds, for deployments
/// where several API instances must show each other's holds.
///
/// Records carry a physical TTL as a backstop on top of the manager's
/// staleness sweep, so a dead deployment cannot leave holds behind
/// forever. Change notifications cover mutations made through this
/// process; other instances observe foreign holds at read time.
pub struct RedisLockStore {
    client: RedisClient,
    /// One storage area per court grid.
    area: String,
    ttl_seconds: u64,
    changes: broadcast::Sender<LockChange>,
}

impl RedisLockStore {
    pub fn new(client: RedisClient, area: impl Into<String>, ttl_seconds: u64) -> Self {
        let (changes, _) = broadcast::channel(100);
        Self {
            client,
            area: area.into(),
            ttl_seconds,
            changes,
        }
    }

    fn notify(&self, slot_id: &SlotId, record: Option<LockRecord>) {
        let _ = self.changes.send(LockChange {
            slot_id: slot_id.clone(),
            record,
        });
    }

    fn parse_record(&self, payload: &str) -> Option<LockRecord> {
        match serde_json::from_str(payload) {
            Ok(record) => Some(record),
            Err(e) => {
                // Garbage in the shared area is treated as no hold at all
                warn!("Dropping unreadable hold record in {}: {}", self.area, e);
                None
            }
        }
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn get(&self, slot_id: &SlotId) -> Result<Option<LockRecord>, LockStoreError> {
        let raw = self
            .client
            .get_slot_hold(&self.area, slot_id.as_str())
            .await
            .map_err(unavailable)?;
        Ok(raw.and_then(|payload| self.parse_record(&payload)))
    }

    async fn set(&self, record: LockRecord) -> Result<(), LockStoreError> {
        let payload = serde_json::to_string(&record)
            .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
        self.client
            .put_slot_hold(
                &self.area,
                record.slot_id.as_str(),
                &payload,
                self.ttl_seconds,
            )
            .await
            .map_err(unavailable)?;
        let slot_id = record.slot_id.clone();
        self.notify(&slot_id, Some(record));
        Ok(())
    }

    async fn delete(&self, slot_id: &SlotId) -> Result<(), LockStoreError> {
        self.client
            .del_slot_hold(&self.area, slot_id.as_str())
            .await
            .map_err(unavailable)?;
        self.notify(slot_id, None);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<LockRecord>, LockStoreError> {
        let payloads = self
            .client
            .list_slot_holds(&self.area)
            .await
            .map_err(unavailable)?;
        Ok(payloads
            .iter()
            .filter_map(|p| self.parse_record(p))
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<LockChange> {
        self.changes.subscribe()
    }
}
