use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockEventKind {
    Acquired,
    Released,
    Expired,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SlotLockEvent {
    pub court_id: Uuid,
    pub slot_key: String,
    pub tab_id: String,
    pub kind: LockEventKind,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub court_id: Uuid,
    pub slot_key: String,
    pub player_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub court_id: Uuid,
    pub slot_key: String,
    pub player_id: String,
    pub timestamp: i64,
}
