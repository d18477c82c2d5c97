use super::dispatch::dispatch;
use super::{Shared, run_loop};
use crate::message::Message;
use crate::store::{QueueStore, zset_key};
use delayq_metrics::{DECODE_FAILURES_TOTAL, KIND_DELAYED, STORE_ERRORS_TOTAL};
use std::sync::Arc;
use tracing::error;

/// Delayed-delivery loop: claim every due member per tick
pub(super) async fn run<S: QueueStore>(shared: Arc<Shared<S>>) {
    let key = zset_key(&shared.topic);
    let shared: &Shared<S> = &shared;
    run_loop(shared, "delayed", || poll_once(shared, &key)).await;
}

async fn poll_once<S: QueueStore>(shared: &Shared<S>, key: &str) {
    let Some(handler) = shared.current_handler().await else {
        return;
    };

    let now_ms = chrono::Utc::now().timestamp_millis();

    // Range read and removal commit together; whichever consumer's
    // transaction lands first owns the members.
    let due = match shared.store.sorted_set_take_by_score(key, 0, now_ms).await {
        Ok(due) => due,
        Err(e) => {
            STORE_ERRORS_TOTAL
                .with_label_values(&["sorted_set_take_by_score"])
                .inc();
            error!(topic = %shared.topic, error = %e, "Delayed set transaction failed");
            return;
        }
    };

    for (payload, _score) in due {
        let msg = match Message::decode(&payload) {
            Ok(msg) => msg,
            Err(e) => {
                DECODE_FAILURES_TOTAL.inc();
                error!(
                    topic = %shared.topic,
                    payload = %String::from_utf8_lossy(&payload),
                    error = %e,
                    "Failed to decode delayed message"
                );
                continue;
            }
        };

        dispatch(shared.topic.clone(), handler.clone(), msg, KIND_DELAYED);
    }
}
