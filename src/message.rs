use crate::error::{QueueError, QueueResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Message envelope
// ============================================================================
//
// Stored as a JSON object in both the immediate list and the delayed sorted
// set:
//
//   {"id":"...","body":"<base64>","timestamp":1700000000,"delayTime":1700000005}
//
// The body is opaque to the queue and is never interpreted.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,

    #[serde(with = "base64_bytes")]
    pub body: Vec<u8>,

    /// Creation time, unix seconds
    pub timestamp: i64,

    /// Unix seconds at which the message becomes eligible for delivery.
    /// Equals `timestamp` for immediate messages.
    #[serde(rename = "delayTime")]
    pub delay_time: i64,
}

impl Message {
    /// Build a message stamped with the current time
    ///
    /// An empty `id` is replaced by a fresh UUID v4.
    pub fn new(id: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let mut id = id.into();
        if id.is_empty() {
            id = Uuid::new_v4().to_string();
        }
        let now = chrono::Utc::now().timestamp();
        Self {
            id,
            body: body.into(),
            timestamp: now,
            delay_time: now,
        }
    }

    pub fn encode(&self) -> QueueResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(QueueError::Encode)
    }

    pub fn decode(payload: &[u8]) -> QueueResult<Self> {
        serde_json::from_slice(payload).map_err(QueueError::Decode)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID:{} body:[{}] t:{} dt:{}",
            self.id,
            String::from_utf8_lossy(&self.body),
            self.timestamp,
            self.delay_time
        )
    }
}

// Helper module for Vec<u8> as a standard base64 JSON string
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A JSON null body decodes to an empty payload
        let encoded = Option::<String>::deserialize(deserializer)?;
        match encoded {
            Some(s) => BASE64.decode(s).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
