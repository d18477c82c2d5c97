// ============================================================================
// Queue Worker - standalone consumer process
// ============================================================================
//
// Consumes every topic listed in QUEUE_WORKER_TOPICS and logs each delivered
// message.
//
// Flow:
// 1. Load configuration from the environment (.env supported)
// 2. Connect to Redis
// 3. Start one Consumer per topic (immediate + delayed poll loops)
// 4. On SIGTERM / Ctrl-C flip the shared shutdown signal
// 5. Wait for every poll loop to stop, log final metrics, exit
//
// Delivery is at-most-once: a message popped by this worker is gone from
// Redis even if the process dies before the handler finishes.
//
// ============================================================================

use anyhow::{Context, Result};
use delayq::{Consumer, ConsumerOptions, Message, MessageHandler};
use delayq_config::QueueConfig;
use delayq_redis::RedisClient;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Handler that records each delivered message in the log
struct LoggingHandler;

#[async_trait::async_trait]
impl MessageHandler for LoggingHandler {
    async fn handle_message(&self, msg: &Message) -> Result<()> {
        let lag_secs = chrono::Utc::now().timestamp() - msg.delay_time;
        info!(
            message_id = %msg.id,
            body_len = msg.body.len(),
            lag_secs = lag_secs,
            "Message delivered"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = QueueConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Queue Worker Starting ===");
    info!("Topics: {}", config.worker.topics.join(","));
    info!("Poll period: {}ms", config.rate_limit_period_ms);

    if config.redis.tls {
        warn!("rediss:// requested but this build has no TLS backend; connect will fail");
    }
    info!("Connecting to Redis at: {}", config.redis.masked_url());

    let store = Arc::new(
        RedisClient::connect(&config.redis.url)
            .await
            .context("Failed to connect to Redis")?,
    );
    store.ping().await.context("Redis did not answer PING")?;
    info!("Connected to Redis");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler
    tokio::spawn(async move {
        wait_for_signal().await;
        if shutdown_tx.send(true).is_err() {
            error!("No consumers left to notify about shutdown");
        }
    });

    let options = ConsumerOptions::from_config(&config);
    let handler: Arc<dyn MessageHandler> = Arc::new(LoggingHandler);

    let mut consumers = Vec::with_capacity(config.worker.topics.len());
    for topic in &config.worker.topics {
        let consumer = Consumer::new(store.clone(), topic.clone(), shutdown_rx.clone(), options.clone());
        consumer.set_handler(handler.clone()).await;
        consumers.push(consumer);
    }
    drop(shutdown_rx);

    for consumer in &consumers {
        consumer.join().await;
        debug!(topic = %consumer.topic(), "Consumer stopped");
    }

    match delayq_metrics::gather_metrics() {
        Ok(metrics) => debug!("Final metrics:\n{}", metrics),
        Err(e) => error!(error = %e, "Failed to gather metrics"),
    }
    info!("Queue worker stopped gracefully");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, initiating graceful shutdown...");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("SIGINT received, initiating graceful shutdown...");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler, waiting for Ctrl-C only");
                tokio::signal::ctrl_c().await.ok();
                info!("SIGINT received, initiating graceful shutdown...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, initiating graceful shutdown...");
    }
}
