pub mod models;
pub mod policy;
pub mod reconcile;
pub mod repository;

pub use models::{Booking, BookingError, BookingStatus};
pub use policy::BookingPolicy;
pub use reconcile::{reconcile_commit, CommitOutcome};
pub use repository::{BookingRepository, BookingRepoError};
