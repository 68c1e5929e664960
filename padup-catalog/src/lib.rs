pub mod club;
pub mod court;
pub mod pricing;
pub mod availability;
pub mod repository;

pub use club::{Club, DayHours, OpeningHours};
pub use court::{CatalogError, Court, Surface};
pub use pricing::{PricingConfig, PricingContext, PricingEngine};
pub use availability::{SlotGrid, SlotStatus, SlotView};
pub use repository::{ClubRepository, CourtRepository};
