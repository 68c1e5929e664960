use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use futures_util::StreamExt;
use padup_core::failopen::FailOpen;
use padup_core::lock::{
    LockResult, LockStore, MemoryLockStore, ReleaseResult, SlotLockManager,
};
use padup_core::slot::SlotId;
use padup_core::tab::TabId;
use padup_shared::models::events::{LockEventKind, SlotLockEvent};
use padup_store::{RedisClient, RedisLockStore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

const STORE_FAILURE_THRESHOLD: usize = 5;
const STORE_RESET_SECONDS: u64 = 30;

/// Where advisory hold records live.
#[derive(Clone)]
pub enum LockBackend {
    /// Process-local map; the single-instance default.
    Memory,
    /// Shared Redis area, for multi-instance deployments.
    Redis(RedisClient),
}

/// One advisory lock manager per court grid, created on first use. Each
/// court is its own storage area, so slot keys (which are purely temporal)
/// cannot collide across courts.
pub struct LockRegistry {
    backend: LockBackend,
    stale_after: chrono::Duration,
    managers: RwLock<HashMap<Uuid, SlotLockManager>>,
}

impl LockRegistry {
    pub fn new(backend: LockBackend, stale_after_seconds: u64) -> Self {
        Self {
            backend,
            stale_after: chrono::Duration::seconds(stale_after_seconds as i64),
            managers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn for_court(&self, court_id: Uuid) -> SlotLockManager {
        if let Some(manager) = self.managers.read().await.get(&court_id) {
            return manager.clone();
        }

        let mut managers = self.managers.write().await;
        if let Some(manager) = managers.get(&court_id) {
            return manager.clone();
        }

        let reset = StdDuration::from_secs(STORE_RESET_SECONDS);
        let store: Arc<dyn LockStore> = match &self.backend {
            LockBackend::Memory => Arc::new(FailOpen::new(
                MemoryLockStore::new(),
                STORE_FAILURE_THRESHOLD,
                reset,
            )),
            LockBackend::Redis(client) => {
                // Physical TTL backstops the sweep at twice the staleness timeout
                let ttl = (self.stale_after.num_seconds() * 2) as u64;
                Arc::new(FailOpen::new(
                    RedisLockStore::new(client.clone(), court_id.to_string(), ttl),
                    STORE_FAILURE_THRESHOLD,
                    reset,
                ))
            }
        };

        let manager = SlotLockManager::with_stale_after(store, self.stale_after);
        managers.insert(court_id, manager.clone());
        manager
    }

    /// Slots currently advertised as held, for the availability grid.
    pub async fn held_slots(&self, court_id: Uuid) -> HashSet<SlotId> {
        let manager = self.for_court(court_id).await;
        let now = Utc::now();
        match manager.store().scan().await {
            Ok(records) => records
                .into_iter()
                .filter(|r| !r.is_stale(now, manager.stale_after()))
                .map(|r| r.slot_id)
                .collect(),
            Err(_) => HashSet::new(),
        }
    }

    /// Sweep every court's area; returns the total removed.
    pub async fn sweep_all(&self, now: DateTime<Utc>) -> usize {
        let managers: Vec<SlotLockManager> =
            self.managers.read().await.values().cloned().collect();

        let mut removed = 0;
        for manager in managers {
            removed += manager.sweep_stale(now).await.unwrap_or(0);
        }
        removed
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotLockRequest {
    /// RFC 3339 slot start, any offset.
    pub slot: String,
    pub tab_id: String,
}

#[derive(Debug, Serialize)]
struct LockStreamEvent {
    slot_key: SlotId,
    held: bool,
    owner_tab: Option<TabId>,
    acquired_at: Option<DateTime<Utc>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/courts/{court_id}/locks", post(acquire_lock))
        .route("/v1/courts/{court_id}/locks", delete(release_lock))
        .route("/v1/courts/{court_id}/locks/stream", get(lock_stream))
}

// ============================================================================
// Handlers
// ============================================================================

async fn acquire_lock(
    State(state): State<AppState>,
    Path(court_id): Path<Uuid>,
    Json(req): Json<SlotLockRequest>,
) -> Result<(StatusCode, Json<LockResult>), AppError> {
    let slot_id = SlotId::parse(&req.slot)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let tab = TabId::new(req.tab_id);

    let manager = state.locks.for_court(court_id).await;
    let result = manager
        .acquire(&slot_id, &tab)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    match result {
        LockResult::Acquired => {
            let event = SlotLockEvent {
                court_id,
                slot_key: slot_id.as_str().to_string(),
                tab_id: tab.as_str().to_string(),
                kind: LockEventKind::Acquired,
                timestamp: Utc::now().timestamp(),
            };
            state.kafka.publish_slot_lock(&event).await;

            Ok((StatusCode::OK, Json(LockResult::Acquired)))
        }
        held @ LockResult::HeldByOther { .. } => {
            // Not an error: the UI shows who is holding the slot
            Ok((StatusCode::CONFLICT, Json(held)))
        }
    }
}

async fn release_lock(
    State(state): State<AppState>,
    Path(court_id): Path<Uuid>,
    Json(req): Json<SlotLockRequest>,
) -> Result<Json<ReleaseResult>, AppError> {
    let slot_id = SlotId::parse(&req.slot)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let tab = TabId::new(req.tab_id);

    let manager = state.locks.for_court(court_id).await;
    let result = manager
        .release(&slot_id, &tab)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if result == ReleaseResult::Released {
        let event = SlotLockEvent {
            court_id,
            slot_key: slot_id.as_str().to_string(),
            tab_id: tab.as_str().to_string(),
            kind: LockEventKind::Released,
            timestamp: Utc::now().timestamp(),
        };
        state.kafka.publish_slot_lock(&event).await;
    }

    Ok(Json(result))
}

/// Server-sent stream of every hold change on this court, so open grids can
/// gray out slots other tabs are holding in real time.
async fn lock_stream(
    State(state): State<AppState>,
    Path(court_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let manager = state.locks.for_court(court_id).await;
    let rx = manager.store().subscribe();

    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(change) => {
                let payload = LockStreamEvent {
                    slot_key: change.slot_id,
                    held: change.record.is_some(),
                    owner_tab: change.record.as_ref().map(|r| r.owner_tab.clone()),
                    acquired_at: change.record.as_ref().map(|r| r.acquired_at),
                };
                match serde_json::to_string(&payload) {
                    Ok(data) => Some(Ok(Event::default().event("slot_lock").data(data))),
                    Err(_) => None,
                }
            }
            // Lagged receivers skip; the next change resyncs the slot
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
