use padup_api::locks::{LockBackend, LockRegistry};
use padup_api::{app, state::{AppState, AuthConfig}, worker};
use padup_booking::policy::BookingPolicy;
use padup_catalog::pricing::{PricingConfig, PricingEngine};
use padup_store::{StoreBookingRepository, StoreCatalogRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "padup_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = padup_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Pad'Up API on port {}", config.server.port);

    // Postgres
    let db = padup_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");
    let db_arc = Arc::new(db);

    // Redis
    let redis_client = padup_store::RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis_arc = Arc::new(redis_client);

    // Kafka
    let kafka_producer = padup_store::EventProducer::new(&config.kafka.brokers)
        .expect("Failed to create Kafka producer");
    let kafka_arc = Arc::new(kafka_producer);

    // Advisory slot locks: per-process by default, Redis-shared when the
    // deployment runs several API instances
    let backend = if config.business_rules.shared_locks {
        LockBackend::Redis(redis_arc.as_ref().clone())
    } else {
        LockBackend::Memory
    };
    let locks = Arc::new(LockRegistry::new(
        backend,
        config.business_rules.slot_hold_seconds,
    ));

    let catalog_repo = Arc::new(StoreCatalogRepository::new(db_arc.pool.clone()));
    let booking_repo = Arc::new(StoreBookingRepository::new(db_arc.pool.clone()));

    let pricing = Arc::new(PricingEngine::new(PricingConfig {
        peak_multiplier: config.business_rules.peak_multiplier,
        peak_start_hour: config.business_rules.peak_start_hour,
        peak_end_hour: config.business_rules.peak_end_hour,
    }));

    let app_state = AppState {
        db: db_arc,
        redis: redis_arc.clone(),
        kafka: kafka_arc,
        clubs: catalog_repo.clone(),
        courts: catalog_repo,
        bookings: booking_repo,
        locks: locks.clone(),
        pricing,
        policy: BookingPolicy::new(config.business_rules.cancellation_cutoff_hours),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        business_rules: config.business_rules.clone(),
    };

    // Background workers
    let sweep_interval = Duration::from_secs((config.business_rules.slot_hold_seconds / 2).max(1));
    tokio::spawn(worker::start_lock_sweeper(locks, sweep_interval));
    tokio::spawn(worker::start_availability_worker(
        config.kafka.brokers.clone(),
        "padup-availability".to_string(),
        redis_arc,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
