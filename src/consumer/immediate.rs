use super::dispatch::dispatch;
use super::{Shared, run_loop};
use crate::message::Message;
use crate::store::{QueueStore, list_key};
use delayq_metrics::{DECODE_FAILURES_TOTAL, KIND_IMMEDIATE, STORE_ERRORS_TOTAL};
use std::sync::Arc;
use tracing::error;

/// Immediate-delivery loop: one LPOP per tick
pub(super) async fn run<S: QueueStore>(shared: Arc<Shared<S>>) {
    let key = list_key(&shared.topic);
    let shared: &Shared<S> = &shared;
    run_loop(shared, "immediate", || poll_once(shared, &key)).await;
}

async fn poll_once<S: QueueStore>(shared: &Shared<S>, key: &str) {
    // No handler yet: no store traffic
    let Some(handler) = shared.current_handler().await else {
        return;
    };

    let payload = match shared.store.list_pop_head(key).await {
        Ok(Some(payload)) => payload,
        Ok(None) => return,
        Err(e) => {
            STORE_ERRORS_TOTAL.with_label_values(&["list_pop_head"]).inc();
            error!(topic = %shared.topic, error = %e, "LPOP failed");
            return;
        }
    };

    if payload.is_empty() {
        return;
    }

    // Already popped: an undecodable payload is dropped for good
    let msg = match Message::decode(&payload) {
        Ok(msg) => msg,
        Err(e) => {
            DECODE_FAILURES_TOTAL.inc();
            error!(
                topic = %shared.topic,
                payload = %String::from_utf8_lossy(&payload),
                error = %e,
                "Failed to decode message"
            );
            return;
        }
    };

    dispatch(shared.topic.clone(), handler, msg, KIND_IMMEDIATE);
}
