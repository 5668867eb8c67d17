use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Created,
    Running,
    Stopped,
}

/// Severity colour of a status signal, as the hosting UI renders it.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Green,
    Yellow,
    Red,
    Grey,
}

/// Rendered outline of a status signal. The hosting UI knows more shapes;
/// only the ring is ever emitted here.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    Ring,
}

/// A human-facing status signal. Purely operational visibility: nothing in
/// the data path may depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NodeStatus {
    pub fill: StatusFill,
    pub shape: StatusShape,
    pub text: String,
}

impl NodeStatus {
    pub fn ring(fill: StatusFill, text: impl Into<String>) -> Self {
        Self { fill, shape: StatusShape::Ring, text: text.into() }
    }
}

/// Where nodes push their status signals. Reporting is infallible by
/// construction so a broken sink can never disturb the data path.
pub trait StatusSink: Send + Sync {
    fn report(&self, node: &str, status: NodeStatus);
}

/// Default sink: forwards signals to the tracing pipeline.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&self, node: &str, status: NodeStatus) {
        debug!(node, fill = ?status.fill, "status: {}", status.text);
    }
}

/// The one trait adapter authors implement.
///
/// Lifecycle: `Created` at construction, `Running` after a successful
/// `start`, `Stopped` after `stop`. `Stopped` is terminal; a node is not
/// reusable once stopped.
#[async_trait]
pub trait FlowNode: Send + Sync {
    /// The registered node type name, e.g. "ot-sim in".
    fn name(&self) -> String;

    fn state(&self) -> NodeState;

    /// Configuration keys this node reads.
    fn list_config(&self) -> Vec<String>;

    /// Open underlying connections. A failure here is fatal to the node
    /// instance; retry policy belongs to the hosting environment.
    async fn start(&mut self) -> Result<(), NodeError>;

    /// Tear down. In-flight work is abandoned, not flushed.
    async fn stop(&mut self) -> Result<(), NodeError>;
}

/// Errors a node implementation can return.
#[derive(Error, Debug, Serialize, Deserialize, JsonSchema)]
pub enum NodeError {
    /// The node was built from configuration the schema should have rejected.
    #[error("invalid node configuration: {0}")]
    Config(String),

    /// The underlying socket could not be opened or connected.
    #[error("connecting to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    /// The node is not in a state where this operation is valid.
    #[error("invalid state for this operation")]
    InvalidState,

    /// An unspecified failure.
    #[error("node error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for NodeError {
    fn from(err: serde_json::Error) -> NodeError {
        NodeError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_signal_serializes_in_ui_terms() {
        let status = NodeStatus::ring(StatusFill::Green, "subscribing");
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"fill": "green", "shape": "ring", "text": "subscribing"})
        );
    }

    #[test]
    fn connect_error_names_the_endpoint() {
        let err = NodeError::Connect {
            endpoint: "tcp://localhost:5678".into(),
            reason: "refused".into(),
        };
        assert!(err.to_string().contains("tcp://localhost:5678"));
    }
}
