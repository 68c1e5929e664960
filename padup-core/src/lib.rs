pub mod slot;
pub mod tab;
pub mod lock;
pub mod failopen;

pub use slot::{InvalidSlotError, Slot, SlotId};
pub use tab::{MemoryTabStore, TabId, TabStore};
pub use lock::{
    LockChange, LockRecord, LockResult, LockState, LockStore, LockStoreError, LockWatch,
    MemoryLockStore, ReleaseResult, SlotLockManager,
};
pub use failopen::FailOpen;
