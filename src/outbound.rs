//! The "ot-sim out" node: takes one numeric-ish payload per graph message and
//! pushes it onto the bus as a control update.

use std::sync::Arc;

use async_trait::async_trait;
use flow_node::node::{FlowNode, NodeError, NodeState, NodeStatus, StatusFill, StatusSink};
use serde_json::Value;
use tracing::warn;

use crate::bus::{Pusher, TOPIC};
use crate::envelope::{Envelope, Point, Update};

/// Sender identity stamped on every update this bridge publishes.
pub const SENDER: &str = "Node-Red";

const NAME: &str = "ot-sim out";

/// Publication binding. Immutable for the lifetime of the node.
#[derive(Debug, Clone)]
pub struct OutboundConfig {
    /// The controlled point on the bus.
    pub tag: String,
    /// PUSH connect target, the bus's pull endpoint.
    pub endpoint: String,
}

pub struct OutboundNode {
    config: OutboundConfig,
    state: NodeState,
    status: Arc<dyn StatusSink>,
    pusher: Option<Pusher>,
}

impl OutboundNode {
    pub fn new(config: OutboundConfig, status: Arc<dyn StatusSink>) -> Result<Self, NodeError> {
        if config.tag.trim().is_empty() {
            return Err(NodeError::Config("tag must not be empty".into()));
        }
        Ok(Self { config, state: NodeState::Created, status, pusher: None })
    }

    /// One graph message in, at most one update envelope out.
    ///
    /// Non-numeric and non-finite inputs are dropped with a diagnostic; a
    /// transmit failure is likewise logged and swallowed, matching the
    /// best-effort zero-linger policy. The only hard error is calling this
    /// before `start`.
    pub async fn publish(&mut self, input: &Value) -> Result<(), NodeError> {
        let pusher = self.pusher.as_mut().ok_or(NodeError::InvalidState)?;

        let Some(value) = coerce_value(input) else {
            warn!(payload = %input, "payload was not a valid floating point number");
            return Ok(());
        };

        let encoded = update_envelope(&self.config.tag, value).encode()?;

        self.status.report(NAME, NodeStatus::ring(StatusFill::Green, "updating"));
        if let Err(e) = pusher.push(TOPIC, encoded).await {
            warn!(error = %e, tag = %self.config.tag, "transmit failed; update dropped");
        }
        self.status.report(NAME, NodeStatus::ring(StatusFill::Yellow, "idle"));
        Ok(())
    }
}

#[async_trait]
impl FlowNode for OutboundNode {
    fn name(&self) -> String {
        NAME.into()
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn list_config(&self) -> Vec<String> {
        vec!["tag".into(), "endpoint".into()]
    }

    async fn start(&mut self) -> Result<(), NodeError> {
        if self.state != NodeState::Created {
            return Err(NodeError::InvalidState);
        }
        self.pusher = Some(Pusher::connect(&self.config.endpoint).await?);
        self.status.report(&self.name(), NodeStatus::ring(StatusFill::Yellow, "idle"));
        self.state = NodeState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), NodeError> {
        if let Some(pusher) = self.pusher.take() {
            pusher.close().await;
        }
        self.state = NodeState::Stopped;
        Ok(())
    }
}

/// 64-bit float coercion of a graph payload: numbers pass through, strings
/// are parsed, everything else is rejected. NaN and infinities never reach
/// the bus.
fn coerce_value(input: &Value) -> Option<f64> {
    let value = match input {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn update_envelope(tag: &str, value: f64) -> Envelope {
    Envelope::new_update(
        SENDER,
        Update {
            updates: vec![Point { tag: tag.to_string(), value, ts: None }],
            ..Default::default()
        },
    )
}
