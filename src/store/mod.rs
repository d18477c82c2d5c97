// ============================================================================
// Queue Store
// ============================================================================
//
// The durability substrate behind producers and consumers:
// - a list per topic for immediate delivery (push tail, pop head)
// - a sorted set per topic for delayed delivery (scored by fire time in ms)
//
// Implementations:
// - redis.rs:  RedisClient (production)
// - memory.rs: MemoryStore (tests, embedders without Redis)
//
// ============================================================================

mod memory;
mod redis;

pub use memory::MemoryStore;

use anyhow::Result;
use delayq_config::{LIST_SUFFIX, ZSET_SUFFIX};

/// Key of the immediate-delivery list for a topic: `<topic>:list`
pub fn list_key(topic: &str) -> String {
    format!("{}{}", topic, LIST_SUFFIX)
}

/// Key of the delayed-delivery sorted set for a topic: `<topic>:zset`
pub fn zset_key(topic: &str) -> String {
    format!("{}{}", topic, ZSET_SUFFIX)
}

/// Storage interface for queued messages
///
/// Implementations must be safe to share between any number of producers
/// and consumers without extra locking.
#[async_trait::async_trait]
pub trait QueueStore: Send + Sync + 'static {
    /// Append a payload to the tail of a list
    async fn list_push_tail(&self, key: &str, payload: Vec<u8>) -> Result<()>;

    /// Remove and return the head of a list
    ///
    /// `Ok(None)` means the list is empty; it is not an error.
    async fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Number of entries in a list
    async fn list_len(&self, key: &str) -> Result<u64>;

    /// Add a payload to a sorted set with the given score
    async fn sorted_set_add(&self, key: &str, score: i64, payload: Vec<u8>) -> Result<()>;

    /// Return and remove every member with `min <= score <= max`
    ///
    /// The range read and the removal must execute as one indivisible unit
    /// with respect to every other caller on the same key. Two consumers
    /// racing on the same due member must never both receive it; a store
    /// that cannot serialize this pair cannot back delayed delivery.
    ///
    /// Members are returned in ascending score order with their scores.
    async fn sorted_set_take_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<(Vec<u8>, i64)>>;

    /// Number of members in a sorted set
    async fn sorted_set_len(&self, key: &str) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_naming() {
        assert_eq!(list_key("task"), "task:list");
        assert_eq!(zset_key("task"), "task:zset");
    }
}
