//! # delayq Redis
//!
//! Low-level Redis client for the delayq message queue.
//!
//! ## Design Principles
//!
//! - **No queue logic** - Pure infrastructure layer
//! - **No dependencies** on other delayq crates
//! - **Shared handle** - `&self` operations over a cloned connection manager
//!
//! ## Features
//!
//! - Connection management with automatic reconnection
//! - List operations (RPUSH / LPOP / LLEN)
//! - Sorted set operations (ZADD / ZCARD)
//! - Atomic range-and-remove by score (MULTI/EXEC)
//!
//! ## Example
//!
//! ```rust,no_run
//! use delayq_redis::RedisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RedisClient::connect("redis://localhost:6379").await?;
//!
//!     client.rpush("jobs:list", "payload").await?;
//!     let head: Option<String> = client.lpop("jobs:list").await?;
//!
//!     Ok(())
//! }
//! ```

mod client;

pub use client::RedisClient;

// Re-export commonly used types
pub use redis::RedisError;

/// Result type for Redis operations
pub type Result<T> = std::result::Result<T, RedisError>;
