// ============================================================================
// Consumer
// ============================================================================
//
// One Consumer per topic. Registering the first handler spawns two poll
// loops that run until the shutdown signal fires:
// - immediate.rs: LPOP one message from <topic>:list per tick
// - delayed.rs:   atomically take every due member of <topic>:zset per tick
//
// Every pulled message is handed to the handler in its own detached task
// (dispatch.rs). Delivery is at-most-once: the message has already left
// the store when the handler runs.
//
// ============================================================================

mod delayed;
mod dispatch;
mod immediate;

use crate::handler::MessageHandler;
use crate::store::QueueStore;
use delayq_config::QueueConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

const DEFAULT_RATE_LIMIT_PERIOD: Duration = Duration::from_millis(200);
const LOOPS_PER_CONSUMER: usize = 2;

/// Consumer tuning
#[derive(Clone, Debug)]
pub struct ConsumerOptions {
    /// Period of both poll loops. Zero falls back to 200ms.
    pub rate_limit_period: Duration,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            rate_limit_period: DEFAULT_RATE_LIMIT_PERIOD,
        }
    }
}

impl ConsumerOptions {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            rate_limit_period: config.rate_limit_period(),
        }
    }

    fn effective_period(&self) -> Duration {
        if self.rate_limit_period.is_zero() {
            DEFAULT_RATE_LIMIT_PERIOD
        } else {
            self.rate_limit_period
        }
    }
}

/// Lifecycle of a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Constructed, no handler registered yet
    Idle,
    /// Handler registered, at least one poll loop alive
    Running,
    /// Shutdown observed by both poll loops
    Stopped,
}

/// State shared between the consumer handle and its poll loops
struct Shared<S: QueueStore> {
    store: Arc<S>,
    topic: Arc<str>,
    handler: RwLock<Option<Arc<dyn MessageHandler>>>,
    rate_limit_period: Duration,
    shutdown: watch::Receiver<bool>,
    live_loops: AtomicUsize,
}

impl<S: QueueStore> Shared<S> {
    async fn current_handler(&self) -> Option<Arc<dyn MessageHandler>> {
        self.handler.read().await.clone()
    }
}

/// Topic-scoped polling consumer
pub struct Consumer<S: QueueStore> {
    shared: Arc<Shared<S>>,
    started: AtomicBool,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: QueueStore> Consumer<S> {
    /// Create an idle consumer for `topic`
    ///
    /// Polling starts on the first `set_handler` call. Sending `true` on the
    /// shutdown channel (or dropping its sender) stops both loops within one
    /// tick.
    pub fn new(
        store: Arc<S>,
        topic: impl Into<String>,
        shutdown: watch::Receiver<bool>,
        options: ConsumerOptions,
    ) -> Self {
        let topic: String = topic.into();
        Self {
            shared: Arc::new(Shared {
                store,
                topic: Arc::from(topic),
                handler: RwLock::new(None),
                rate_limit_period: options.effective_period(),
                shutdown,
                // Counts loops not yet exited; only read once `started` is set
                live_loops: AtomicUsize::new(LOOPS_PER_CONSUMER),
            }),
            started: AtomicBool::new(false),
            loops: Mutex::new(Vec::new()),
        }
    }

    pub fn topic(&self) -> &str {
        &self.shared.topic
    }

    pub fn rate_limit_period(&self) -> Duration {
        self.shared.rate_limit_period
    }

    /// Register the message handler
    ///
    /// The first call starts both poll loops; later calls only replace the
    /// handler used by subsequent ticks.
    pub async fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        *self.shared.handler.write().await = Some(handler);

        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let immediate = tokio::spawn(immediate::run(self.shared.clone()));
        let delayed = tokio::spawn(delayed::run(self.shared.clone()));
        self.loops.lock().await.extend([immediate, delayed]);

        info!(
            topic = %self.shared.topic,
            period_ms = self.shared.rate_limit_period.as_millis() as u64,
            "Consumer started"
        );
    }

    pub fn state(&self) -> ConsumerState {
        if !self.started.load(Ordering::SeqCst) {
            ConsumerState::Idle
        } else if self.shared.live_loops.load(Ordering::SeqCst) > 0 {
            ConsumerState::Running
        } else {
            ConsumerState::Stopped
        }
    }

    /// Wait for both poll loops to exit
    ///
    /// Returns immediately for an idle consumer. Handler tasks that were
    /// already dispatched are not awaited.
    pub async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = self.loops.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(topic = %self.shared.topic, error = %e, "Poll loop task failed");
            }
        }
    }
}

/// Resolves once shutdown is requested or the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Drive `poll` once per period until shutdown
///
/// Store calls inside `poll` are never interrupted; shutdown is checked
/// between ticks, and wins over a tick that is ready at the same time.
async fn run_loop<S, F, Fut>(shared: &Shared<S>, loop_name: &'static str, mut poll: F)
where
    S: QueueStore,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut shutdown = shared.shutdown.clone();
    let mut ticker = interval(shared.rate_limit_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                break;
            }
            _ = ticker.tick() => {}
        }

        poll().await;
    }

    shared.live_loops.fetch_sub(1, Ordering::SeqCst);
    info!(topic = %shared.topic, loop_name, "Stopped processing queue messages");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::store::MemoryStore;

    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle_message(&self, _msg: &Message) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counting_handler() -> Arc<CountingHandler> {
        Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        })
    }

    fn fast_options() -> ConsumerOptions {
        ConsumerOptions {
            rate_limit_period: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_zero_period_falls_back_to_default() {
        let options = ConsumerOptions {
            rate_limit_period: Duration::ZERO,
        };
        assert_eq!(options.effective_period(), Duration::from_millis(200));
        assert_eq!(
            ConsumerOptions::default().rate_limit_period,
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_options_from_config() {
        let mut config = QueueConfig::with_redis_url("redis://127.0.0.1:6379");
        config.rate_limit_period_ms = 50;
        assert_eq!(
            ConsumerOptions::from_config(&config).rate_limit_period,
            Duration::from_millis(50)
        );
    }

    #[tokio::test]
    async fn test_idle_until_handler_registered() {
        let store = Arc::new(MemoryStore::new());
        let (_tx, rx) = watch::channel(false);
        let consumer = Consumer::new(store, "t", rx, fast_options());

        assert_eq!(consumer.state(), ConsumerState::Idle);
        consumer.join().await;
        assert_eq!(consumer.state(), ConsumerState::Idle);
    }

    #[tokio::test]
    async fn test_repeated_registration_starts_loops_once() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(false);
        let consumer = Consumer::new(store, "t", rx, fast_options());

        consumer.set_handler(counting_handler()).await;
        consumer.set_handler(counting_handler()).await;
        consumer.set_handler(counting_handler()).await;

        assert_eq!(consumer.state(), ConsumerState::Running);
        assert_eq!(consumer.loops.lock().await.len(), 2);

        tx.send(true).unwrap();
        consumer.join().await;
        assert_eq!(consumer.state(), ConsumerState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_starting_consumer_never_reports_stopped() {
        for _ in 0..50 {
            let store = Arc::new(MemoryStore::new());
            let (tx, rx) = watch::channel(false);
            let consumer = Arc::new(Consumer::new(store, "t", rx, fast_options()));

            let observer = {
                let consumer = consumer.clone();
                tokio::spawn(async move {
                    for _ in 0..1_000 {
                        assert_ne!(consumer.state(), ConsumerState::Stopped);
                        tokio::task::yield_now().await;
                    }
                })
            };
            consumer.set_handler(counting_handler()).await;
            assert_eq!(consumer.state(), ConsumerState::Running);
            observer.await.unwrap();

            tx.send(true).unwrap();
            consumer.join().await;
            assert_eq!(consumer.state(), ConsumerState::Stopped);
        }
    }

    #[tokio::test]
    async fn test_swapped_handler_receives_later_messages() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(false);
        let consumer = Consumer::new(store.clone(), "t", rx, fast_options());

        let first = counting_handler();
        let second = counting_handler();
        consumer.set_handler(first.clone()).await;
        consumer.set_handler(second.clone()).await;

        let payload = Message::new("", "x").encode().unwrap();
        store.list_push_tail("t:list", payload).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);

        tx.send(true).unwrap();
        consumer.join().await;
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_loops() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(false);
        let consumer = Consumer::new(store, "t", rx, fast_options());
        consumer.set_handler(counting_handler()).await;

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), consumer.join())
            .await
            .expect("loops should stop when the shutdown sender is dropped");
        assert_eq!(consumer.state(), ConsumerState::Stopped);
    }
}
