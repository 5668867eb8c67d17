//! The "ot-sim in" node: follows one tagged point on the bus and injects its
//! values into the hosting graph.

use std::sync::Arc;

use async_trait::async_trait;
use flow_node::message::FlowMessage;
use flow_node::node::{FlowNode, NodeError, NodeState, NodeStatus, StatusFill, StatusSink};
use serde_json::json;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::Subscriber;
use crate::envelope::{Envelope, Kind};
use crate::tags;

/// Subscription binding. Immutable for the lifetime of the node.
#[derive(Debug, Clone)]
pub struct InboundConfig {
    /// The point of interest on the bus.
    pub tag: String,
    /// Relay `Update` envelopes in addition to `Status`.
    pub updates: bool,
    /// SUB connect target, the bus's publish endpoint.
    pub endpoint: String,
}

pub struct InboundNode {
    config: InboundConfig,
    state: NodeState,
    status: Arc<dyn StatusSink>,
    out_tx: Option<UnboundedSender<FlowMessage>>,
    out_rx: UnboundedReceiver<FlowMessage>,
    stop_tx: Option<watch::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl InboundNode {
    pub fn new(config: InboundConfig, status: Arc<dyn StatusSink>) -> Result<Self, NodeError> {
        if config.tag.trim().is_empty() {
            return Err(NodeError::Config("tag must not be empty".into()));
        }
        let (out_tx, out_rx) = unbounded_channel();
        Ok(Self {
            config,
            state: NodeState::Created,
            status,
            out_tx: Some(out_tx),
            out_rx,
            stop_tx: None,
            task: None,
        })
    }

    /// Next value emitted for the graph, in bus delivery order. `None` once
    /// the node has stopped and the queue has drained.
    pub async fn recv(&mut self) -> Option<FlowMessage> {
        self.out_rx.recv().await
    }
}

#[async_trait]
impl FlowNode for InboundNode {
    fn name(&self) -> String {
        "ot-sim in".into()
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn list_config(&self) -> Vec<String> {
        vec!["tag".into(), "updates".into(), "endpoint".into()]
    }

    async fn start(&mut self) -> Result<(), NodeError> {
        if self.state != NodeState::Created {
            return Err(NodeError::InvalidState);
        }
        let mut subscriber = Subscriber::connect(&self.config.endpoint).await?;

        let worker = InboundWorker {
            tag: self.config.tag.clone(),
            updates: self.config.updates,
            out: self.out_tx.take().ok_or(NodeError::InvalidState)?,
        };
        let (stop_tx, mut stop_rx) = watch::channel(());
        self.stop_tx = Some(stop_tx);

        self.task = Some(tokio::spawn(async move {
            loop {
                // Biased toward the stop signal: a frame that raced the
                // signal is dropped, not handled.
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    frame = subscriber.recv() => match frame {
                        Ok((_topic, payload)) => worker.handle(&payload),
                        Err(e) => {
                            warn!(error = %e, "subscriber receive failed");
                            break;
                        }
                    },
                }
            }
            subscriber.close().await;
        }));

        self.status.report(&self.name(), NodeStatus::ring(StatusFill::Green, "subscribing"));
        self.state = NodeState::Running;
        Ok(())
    }

    /// Signals the receive loop and waits for it to exit. Once this returns
    /// the socket is closed and nothing further enters the emission queue.
    async fn stop(&mut self) -> Result<(), NodeError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| NodeError::Other(e.to_string()))?;
        }
        self.state = NodeState::Stopped;
        Ok(())
    }
}

/// Per-message translation, run to completion for each delivered frame pair.
struct InboundWorker {
    tag: String,
    updates: bool,
    out: UnboundedSender<FlowMessage>,
}

impl InboundWorker {
    fn handle(&self, payload: &[u8]) {
        let env = match Envelope::decode(payload) {
            Ok(env) => env,
            // Malformed upstream traffic is dropped, never fatal.
            Err(e) => {
                debug!(error = %e, "dropping malformed envelope");
                return;
            }
        };

        match env.kind {
            Kind::Status => {
                if let Some(status) = env.status() {
                    for point in tags::select(&status.measurements, &self.tag) {
                        self.emit(Some(self.tag.clone()), point.value);
                    }
                }
            }
            Kind::Update if self.updates => {
                if let Some(update) = env.update() {
                    for point in tags::select(&update.updates, &self.tag) {
                        // No routing key: downstream disambiguates by wiring.
                        self.emit(None, point.value);
                    }
                }
            }
            _ => {}
        }
    }

    fn emit(&self, topic: Option<String>, value: f64) {
        if !value.is_finite() {
            debug!(tag = %self.tag, "dropping non-finite value");
            return;
        }
        let _ = self.out.send(FlowMessage::new(topic, json!(value)));
    }
}
