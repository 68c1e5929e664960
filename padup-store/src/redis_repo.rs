use redis::{AsyncCommands, RedisResult};
use tracing::debug;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    // Slot hold records. Each storage area (one court's grid) keeps a
    // member index so holds can be listed without SCAN.

    pub async fn put_slot_hold(
        &self,
        area: &str,
        slot_key: &str,
        payload: &str,
        ttl_seconds: u64,
    ) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("slothold:{}:{}", area, slot_key);
        let index = format!("slothold-index:{}", area);

        let _: () = redis::pipe()
            .atomic()
            .set_ex(&key, payload, ttl_seconds)
            .ignore()
            .sadd(&index, slot_key)
            .ignore()
            .query_async(&mut conn)
            .await?;
        debug!("Slot hold written: {}/{}", area, slot_key);
        Ok(())
    }

    pub async fn get_slot_hold(&self, area: &str, slot_key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("slothold:{}:{}", area, slot_key);
        conn.get(key).await
    }

    pub async fn del_slot_hold(&self, area: &str, slot_key: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("slothold:{}:{}", area, slot_key);
        let index = format!("slothold-index:{}", area);

        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .srem(&index, slot_key)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// All live hold payloads in one area. Members whose record expired
    /// (TTL backstop) are dropped from the index as they are discovered.
    pub async fn list_slot_holds(&self, area: &str) -> RedisResult<Vec<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let index = format!("slothold-index:{}", area);

        let members: Vec<String> = conn.smembers(&index).await?;
        let mut payloads = Vec::with_capacity(members.len());
        for slot_key in members {
            let key = format!("slothold:{}:{}", area, slot_key);
            let value: Option<String> = conn.get(&key).await?;
            match value {
                Some(payload) => payloads.push(payload),
                None => {
                    let _: () = conn.srem(&index, &slot_key).await?;
                }
            }
        }
        Ok(payloads)
    }

    // Availability cache, one entry per court and day

    pub async fn get_court_availability(
        &self,
        court_id: &str,
        date: &str,
    ) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("availability:{}:{}", court_id, date);
        conn.get(key).await
    }

    pub async fn set_court_availability(
        &self,
        court_id: &str,
        date: &str,
        payload: &str,
        ttl_seconds: u64,
    ) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("availability:{}:{}", court_id, date);
        conn.set_ex::<_, _, ()>(key, payload, ttl_seconds).await?;
        Ok(())
    }

    pub async fn del_court_availability(&self, court_id: &str, date: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("availability:{}:{}", court_id, date);
        conn.del(key).await
    }

    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
