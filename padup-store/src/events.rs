use padup_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent, SlotLockEvent};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, error};

pub const TOPIC_BOOKING_CONFIRMED: &str = "booking.confirmed";
pub const TOPIC_BOOKING_CANCELLED: &str = "booking.cancelled";
pub const TOPIC_SLOT_LOCKS: &str = "slot.locks";

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(0)))
            .await
        {
            Ok(delivery) => {
                debug!(
                    "Published to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to publish to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    pub async fn publish_booking_confirmed(&self, event: &BookingConfirmedEvent) {
        // Event delivery is best-effort; the booking row is already committed
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = self
                .publish(
                    TOPIC_BOOKING_CONFIRMED,
                    &event.court_id.to_string(),
                    &payload,
                )
                .await;
        }
    }

    pub async fn publish_booking_cancelled(&self, event: &BookingCancelledEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = self
                .publish(
                    TOPIC_BOOKING_CANCELLED,
                    &event.court_id.to_string(),
                    &payload,
                )
                .await;
        }
    }

    pub async fn publish_slot_lock(&self, event: &SlotLockEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = self
                .publish(TOPIC_SLOT_LOCKS, &event.court_id.to_string(), &payload)
                .await;
        }
    }
}
