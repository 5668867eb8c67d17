use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single message travelling through the hosting node graph.
///
/// `topic` is the optional routing key: consumers that fan out by key read it,
/// consumers wired directly to the producing node ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlowMessage {
    /// Unique ID assigned by the producing node.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl FlowMessage {
    pub fn new(topic: Option<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic,
            payload,
            timestamp: Utc::now(),
        }
    }
}
