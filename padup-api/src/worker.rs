use crate::locks::LockRegistry;
use chrono::Utc;
use padup_core::slot::SlotId;
use padup_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent};
use padup_store::RedisClient;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Periodically reclaim advisory holds whose tab disappeared without
/// releasing. Runs at half the staleness timeout so a stuck slot is never
/// blocked for much longer than the timeout itself.
pub async fn start_lock_sweeper(registry: Arc<LockRegistry>, interval: Duration) {
    info!("Lock sweeper started, interval {:?}", interval);
    loop {
        sleep(interval).await;
        let removed = registry.sweep_all(Utc::now()).await;
        if removed > 0 {
            info!("Lock sweeper reclaimed {} abandoned holds", removed);
        }
    }
}

/// Consume booking events and drop the affected availability cache entry so
/// the next grid request re-reads the bookings table.
pub async fn start_availability_worker(
    brokers: String,
    group_id: String,
    redis: Arc<RedisClient>,
) {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()
        .expect("Consumer creation failed");

    consumer
        .subscribe(&[
            padup_store::events::TOPIC_BOOKING_CONFIRMED,
            padup_store::events::TOPIC_BOOKING_CANCELLED,
        ])
        .expect("Can't subscribe");

    info!("Availability worker started, listening for booking events...");

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                if let Some(Ok(payload)) = m.payload_view::<str>() {
                    let target = match m.topic() {
                        t if t == padup_store::events::TOPIC_BOOKING_CONFIRMED => {
                            serde_json::from_str::<BookingConfirmedEvent>(payload)
                                .ok()
                                .map(|e| (e.court_id, e.slot_key))
                        }
                        _ => serde_json::from_str::<BookingCancelledEvent>(payload)
                            .ok()
                            .map(|e| (e.court_id, e.slot_key)),
                    };

                    let Some((court_id, slot_key)) = target else {
                        error!("Unreadable booking event payload, skipping");
                        continue;
                    };

                    if let Err(e) = invalidate_availability(&redis, court_id, &slot_key).await {
                        error!("Failed to invalidate availability cache: {}", e);
                    }
                }
            }
        }
    }
}

async fn invalidate_availability(
    redis: &RedisClient,
    court_id: uuid::Uuid,
    slot_key: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let date = SlotId::parse(slot_key)?.starts_at().date_naive().to_string();
    redis
        .del_court_availability(&court_id.to_string(), &date)
        .await?;
    info!("Availability cache invalidated: {}/{}", court_id, date);
    Ok(())
}
