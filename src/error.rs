use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

/// Errors returned to producers and embedders
///
/// Consumer poll loops never return these: store, decode and handler
/// failures inside a loop are logged and the tick is skipped.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Delayed publish with a delay that is zero, negative, or overflows the clock
    #[error("invalid delay: {0}")]
    InvalidDelay(String),

    #[error("Failed to encode message envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode message envelope: {0}")]
    Decode(#[source] serde_json::Error),

    /// Store failure, passed through unchanged
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl QueueError {
    pub fn is_invalid_delay(&self) -> bool {
        matches!(self, QueueError::InvalidDelay(_))
    }
}
