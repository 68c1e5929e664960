pub mod app_config;
pub mod database;
pub mod redis_repo;
pub mod lock_store;
pub mod catalog_repo;
pub mod booking_repo;
pub mod events;

pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use lock_store::RedisLockStore;
pub use catalog_repo::StoreCatalogRepository;
pub use booking_repo::StoreBookingRepository;
pub use events::EventProducer;
