use crate::court::Court;
use chrono::{DateTime, Timelike, Utc};
use padup_core::slot::Slot;
use serde::{Deserialize, Serialize};

/// Context for pricing one slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingContext {
    /// Does the slot start inside the configured peak window?
    pub is_peak: bool,

    /// Percentage discount for club members (0.0 - 1.0)
    pub member_discount: f64,
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            is_peak: false,
            member_discount: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Multiplier applied inside the peak window
    pub peak_multiplier: f64,

    /// Peak window start hour (UTC, inclusive)
    pub peak_start_hour: u32,

    /// Peak window end hour (UTC, exclusive)
    pub peak_end_hour: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            peak_multiplier: 1.25,
            peak_start_hour: 17,
            peak_end_hour: 21,
        }
    }
}

/// Court slot pricing
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn context_for(&self, starts_at: DateTime<Utc>) -> PricingContext {
        let hour = starts_at.hour();
        PricingContext {
            is_peak: hour >= self.config.peak_start_hour && hour < self.config.peak_end_hour,
            member_discount: 0.0,
        }
    }

    /// Price for one slot on one court, in cents. The court's base rate is
    /// hourly; the slot's duration scales it.
    pub fn quote(&self, court: &Court, slot: &Slot, context: &PricingContext) -> i32 {
        let minutes = slot.duration().num_minutes().max(0) as i64;
        let mut price = (court.base_price_cents as i64 * minutes / 60) as i32;

        if context.is_peak {
            price = (price as f64 * self.config.peak_multiplier) as i32;
        }

        if context.member_discount > 0.0 {
            price = (price as f64 * (1.0 - context.member_discount)) as i32;
        }

        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::court::Surface;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn court(base_price_cents: i32) -> Court {
        Court {
            id: Uuid::new_v4(),
            club_id: Uuid::new_v4(),
            name: "Court 1".to_string(),
            surface: Surface::ArtificialGrass,
            indoor: true,
            base_price_cents,
            is_active: true,
        }
    }

    #[test]
    fn test_off_peak_quote_scales_with_duration() {
        let engine = PricingEngine::new(PricingConfig::default());
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let slot = Slot::new(start, start + chrono::Duration::minutes(90)).unwrap();

        let context = engine.context_for(start);
        assert!(!context.is_peak);
        // 2400 cents/hour * 1.5h
        assert_eq!(engine.quote(&court(2400), &slot, &context), 3600);
    }

    #[test]
    fn test_peak_multiplier_applies() {
        let engine = PricingEngine::new(PricingConfig::default());
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
        let slot = Slot::new(start, start + chrono::Duration::minutes(60)).unwrap();

        let context = engine.context_for(start);
        assert!(context.is_peak);
        assert_eq!(engine.quote(&court(2400), &slot, &context), 3000);
    }

    #[test]
    fn test_member_discount() {
        let engine = PricingEngine::new(PricingConfig::default());
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        let slot = Slot::new(start, start + chrono::Duration::minutes(60)).unwrap();

        let context = PricingContext {
            is_peak: false,
            member_discount: 0.10,
        };
        assert_eq!(engine.quote(&court(2000), &slot, &context), 1800);
    }
}
