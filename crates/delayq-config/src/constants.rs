// ============================================================================
// Configuration Constants
// ============================================================================

// Consumer polling period (in milliseconds)
pub(crate) const DEFAULT_RATE_LIMIT_PERIOD_MS: u64 = 200;

// Topics consumed by queue-worker when QUEUE_WORKER_TOPICS is unset
pub(crate) const DEFAULT_WORKER_TOPICS: &str = "default";

pub(crate) const DEFAULT_RUST_LOG: &str = "info";

// Key suffixes appended to a topic name
// "<topic>:list" holds immediate messages (FIFO list)
// "<topic>:zset" holds delayed messages (sorted set scored by fire time in ms)
pub const LIST_SUFFIX: &str = ":list";
pub const ZSET_SUFFIX: &str = ":zset";
