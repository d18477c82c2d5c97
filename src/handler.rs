use crate::message::Message;
use anyhow::Result;

/// Receives every message a consumer pulls off its topic
///
/// Each invocation runs in its own detached task; a returned error is logged
/// and the message is not retried.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle_message(&self, msg: &Message) -> Result<()>;
}
