//! # delayq
//!
//! Lightweight message queue on Redis lists and sorted sets.
//!
//! - **Immediate delivery**: `Producer::publish` appends to `<topic>:list`;
//!   the consumer pops one message per tick (FIFO).
//! - **Delayed delivery**: `Producer::publish_delay_msg` adds to
//!   `<topic>:zset` scored by fire time in milliseconds; the consumer claims
//!   every due member per tick in one transaction.
//!
//! Handlers run in detached tasks. Delivery is at-most-once: a message is
//! removed from the store before its handler runs, and handler failures are
//! logged, never retried.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use delayq::{Consumer, ConsumerOptions, Message, MessageHandler, Producer};
//! use delayq_redis::RedisClient;
//! use tokio::sync::watch;
//!
//! struct PrintHandler;
//!
//! #[async_trait::async_trait]
//! impl MessageHandler for PrintHandler {
//!     async fn handle_message(&self, msg: &Message) -> anyhow::Result<()> {
//!         println!("{}", msg);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(RedisClient::connect("redis://localhost:6379").await?);
//!
//!     let producer = Producer::new(store.clone());
//!     producer.publish("task", "this is a test task body").await?;
//!     producer
//!         .publish_delay_msg("task", "runs in 5s", chrono::Duration::seconds(5))
//!         .await?;
//!
//!     let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let consumer = Consumer::new(store, "task", shutdown_rx, ConsumerOptions::default());
//!     consumer.set_handler(Arc::new(PrintHandler)).await;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(6)).await;
//!     shutdown_tx.send(true)?;
//!     consumer.join().await;
//!     Ok(())
//! }
//! ```

pub mod consumer;
pub mod error;
pub mod handler;
pub mod message;
pub mod producer;
pub mod store;

pub use consumer::{Consumer, ConsumerOptions, ConsumerState};
pub use error::{QueueError, QueueResult};
pub use handler::MessageHandler;
pub use message::Message;
pub use producer::Producer;
pub use store::{MemoryStore, QueueStore, list_key, zset_key};
