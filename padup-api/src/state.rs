use crate::locks::LockRegistry;
use padup_booking::policy::BookingPolicy;
use padup_booking::repository::BookingRepository;
use padup_catalog::pricing::PricingEngine;
use padup_catalog::repository::{ClubRepository, CourtRepository};
use padup_store::{DbClient, EventProducer, RedisClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbClient>,
    pub redis: Arc<RedisClient>,
    pub kafka: Arc<EventProducer>,
    pub clubs: Arc<dyn ClubRepository>,
    pub courts: Arc<dyn CourtRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub locks: Arc<LockRegistry>,
    pub pricing: Arc<PricingEngine>,
    pub policy: BookingPolicy,
    pub auth: AuthConfig,
    pub business_rules: padup_store::app_config::BusinessRules,
}
