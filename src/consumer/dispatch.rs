use crate::handler::MessageHandler;
use crate::message::Message;
use delayq_metrics::{HANDLER_FAILURES_TOTAL, MESSAGES_DELIVERED_TOTAL};
use std::sync::Arc;
use tracing::{error, info};

/// Run the handler for one message in a detached task
///
/// The task is never joined: the poll loop moves on immediately, dispatch
/// concurrency is unbounded, and a hanging handler is never timed out.
pub(super) fn dispatch(
    topic: Arc<str>,
    handler: Arc<dyn MessageHandler>,
    msg: Message,
    kind: &'static str,
) {
    MESSAGES_DELIVERED_TOTAL.with_label_values(&[kind]).inc();

    tokio::spawn(async move {
        info!(topic = %topic, message = %msg, "Processing message");
        if let Err(e) = handler.handle_message(&msg).await {
            HANDLER_FAILURES_TOTAL.inc();
            error!(
                topic = %topic,
                message_id = %msg.id,
                error = %e,
                "Message handler failed"
            );
        }
    });
}
