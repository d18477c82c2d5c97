//! Redis client implementation with connection management

use crate::Result;
use redis::{AsyncCommands, aio::ConnectionManager};

/// Redis client with automatic reconnection
///
/// Cloning is cheap: every clone shares the same underlying multiplexed
/// connection. Operations take `&self` and work on a clone of the
/// connection manager, so one client can be shared across tasks.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    /// Connect to Redis server
    ///
    /// Accepts redis:// and unix socket URLs. The crate is built without a
    /// TLS backend, so rediss:// URLs fail here.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Get connection manager (for advanced operations)
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// PING - Check that the server is reachable
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// DEL - Delete one or more keys
    pub async fn del<K>(&self, keys: K) -> Result<i64>
    where
        K: redis::ToRedisArgs + Send + Sync,
    {
        self.connection().del(keys).await
    }

    // ============================================================================
    // List Operations
    // ============================================================================

    /// RPUSH - Push to tail of list
    pub async fn rpush<V>(&self, key: &str, value: V) -> Result<i64>
    where
        V: redis::ToRedisArgs + Send + Sync,
    {
        self.connection().rpush(key, value).await
    }

    /// LPOP - Pop from head of list
    ///
    /// Returns `None` when the list is empty or missing.
    pub async fn lpop<T: redis::FromRedisValue>(&self, key: &str) -> Result<Option<T>> {
        self.connection().lpop(key, None).await
    }

    /// LLEN - Get list length
    pub async fn llen(&self, key: &str) -> Result<i64> {
        self.connection().llen(key).await
    }

    // ============================================================================
    // Sorted Set Operations
    // ============================================================================

    /// ZADD - Add member with score
    pub async fn zadd<V>(&self, key: &str, member: V, score: i64) -> Result<i64>
    where
        V: redis::ToRedisArgs + Send + Sync,
    {
        self.connection().zadd(key, member, score).await
    }

    /// ZCARD - Get sorted set size
    pub async fn zcard(&self, key: &str) -> Result<i64> {
        self.connection().zcard(key).await
    }

    /// ZRANGEBYSCORE WITHSCORES + ZREMRANGEBYSCORE in one MULTI/EXEC
    ///
    /// Returns every member with `min <= score <= max` and removes the same
    /// range. Redis executes the transaction without interleaving other
    /// commands, so concurrent callers never receive the same member.
    pub async fn ztake_by_score(&self, key: &str, min: i64, max: i64) -> Result<Vec<(Vec<u8>, f64)>> {
        let mut conn = self.connection();
        let (members,): (Vec<(Vec<u8>, f64)>,) = redis::pipe()
            .atomic()
            .zrangebyscore_withscores(key, min, max)
            .zrembyscore(key, min, max)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(members)
    }
}
