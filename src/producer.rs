use crate::error::{QueueError, QueueResult};
use crate::message::Message;
use crate::store::{QueueStore, list_key, zset_key};
use delayq_metrics::{KIND_DELAYED, KIND_IMMEDIATE, MESSAGES_PUBLISHED_TOTAL};
use std::sync::Arc;
use tracing::debug;

/// Writes messages into the store
///
/// Holds nothing but the store handle: each call performs exactly one store
/// write, with no buffering and no retry. Clone freely and share between
/// tasks.
pub struct Producer<S: QueueStore> {
    store: Arc<S>,
}

impl<S: QueueStore> Clone for Producer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: QueueStore> Producer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Publish for immediate delivery (RPUSH to `<topic>:list`)
    pub async fn publish(&self, topic: &str, body: impl Into<Vec<u8>>) -> QueueResult<()> {
        let msg = Message::new("", body);
        let payload = msg.encode()?;

        self.store.list_push_tail(&list_key(topic), payload).await?;

        MESSAGES_PUBLISHED_TOTAL
            .with_label_values(&[KIND_IMMEDIATE])
            .inc();
        debug!(topic = %topic, message_id = %msg.id, "Published message");
        Ok(())
    }

    /// Publish for delivery once `delay` has elapsed (ZADD to `<topic>:zset`)
    ///
    /// The sorted-set score is the fire time in epoch milliseconds; the
    /// envelope's `delayTime` carries the same instant in seconds.
    /// A delay that is zero or negative fails before anything is written.
    pub async fn publish_delay_msg(
        &self,
        topic: &str,
        body: impl Into<Vec<u8>>,
        delay: chrono::Duration,
    ) -> QueueResult<()> {
        if delay <= chrono::Duration::zero() {
            return Err(QueueError::InvalidDelay(format!(
                "delay must be greater than zero, got {}ms",
                delay.num_milliseconds()
            )));
        }

        let fire_at = chrono::Utc::now()
            .checked_add_signed(delay)
            .ok_or_else(|| QueueError::InvalidDelay("delay overflows the clock".to_string()))?;

        let mut msg = Message::new("", body);
        msg.delay_time = fire_at.timestamp();
        let payload = msg.encode()?;
        let score = fire_at.timestamp_millis();

        self.store
            .sorted_set_add(&zset_key(topic), score, payload)
            .await?;

        MESSAGES_PUBLISHED_TOTAL
            .with_label_values(&[KIND_DELAYED])
            .inc();
        debug!(
            topic = %topic,
            message_id = %msg.id,
            fire_at_ms = score,
            "Published delayed message"
        );
        Ok(())
    }
}
