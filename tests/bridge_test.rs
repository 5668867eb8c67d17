//! End-to-end tests over real sockets: a PUB peer standing in for the bus
//! broadcast side, a PULL peer standing in for its update collector.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flow_node::node::{FlowNode, NodeStatus, StatusSink};
use otsim_bridge::bus::TOPIC;
use otsim_bridge::envelope::{Envelope, Kind, Point, Status, Update};
use otsim_bridge::inbound::{InboundConfig, InboundNode};
use otsim_bridge::outbound::{OutboundConfig, OutboundNode};
use serde_json::json;
use tokio::time::{sleep, timeout};
use zeromq::{PubSocket, PullSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

struct CaptureSink(Mutex<Vec<String>>);

impl CaptureSink {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Vec::new())))
    }

    fn texts(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl StatusSink for CaptureSink {
    fn report(&self, _node: &str, status: NodeStatus) {
        self.0.lock().unwrap().push(status.text);
    }
}

fn status_envelope(tag: &str, value: f64) -> Vec<u8> {
    Envelope::new_status(
        "test-harness",
        Status { measurements: vec![Point { tag: tag.into(), value, ts: None }] },
    )
    .encode()
    .unwrap()
}

fn update_envelope(tag: &str, value: f64) -> Vec<u8> {
    Envelope::new_update(
        "test-harness",
        Update { updates: vec![Point { tag: tag.into(), value, ts: None }], ..Default::default() },
    )
    .encode()
    .unwrap()
}

async fn broadcast(bus: &mut PubSocket, payload: &[u8]) {
    let mut frame = ZmqMessage::from(TOPIC.to_string());
    frame.push_back(payload.to_vec().into());
    bus.send(frame).await.expect("bus send");
}

/// PUB/SUB joins are asynchronous, so keep broadcasting until the node sees
/// one delivery.
async fn broadcast_until_received(
    bus: &mut PubSocket,
    node: &mut InboundNode,
    payload: &[u8],
) -> flow_node::message::FlowMessage {
    timeout(Duration::from_secs(10), async {
        loop {
            broadcast(bus, payload).await;
            if let Ok(Some(msg)) = timeout(Duration::from_millis(100), node.recv()).await {
                return msg;
            }
        }
    })
    .await
    .expect("no emission within deadline")
}

/// Swallow emissions still queued from the join handshake.
async fn drain(node: &mut InboundNode) {
    while let Ok(Some(_)) = timeout(Duration::from_millis(200), node.recv()).await {}
}

#[tokio::test]
async fn inbound_emits_matching_measurements() {
    let mut bus = PubSocket::new();
    let endpoint = bus.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

    let sink = CaptureSink::new();
    let mut node = InboundNode::new(
        InboundConfig { tag: "BRK1".into(), updates: false, endpoint },
        sink.clone(),
    )
    .unwrap();
    node.start().await.unwrap();
    assert_eq!(sink.texts(), vec!["subscribing".to_string()]);

    let payload = Envelope::new_status(
        "test-harness",
        Status {
            measurements: vec![
                Point { tag: "BRK1".into(), value: 1.0, ts: None },
                Point { tag: "BRK2".into(), value: 0.0, ts: None },
            ],
        },
    )
    .encode()
    .unwrap();

    let msg = broadcast_until_received(&mut bus, &mut node, &payload).await;
    assert_eq!(msg.topic.as_deref(), Some("BRK1"));
    assert_eq!(msg.payload, json!(1.0));

    // Terminal stop: the worker winds down and the emission channel closes.
    node.stop().await.unwrap();
    timeout(Duration::from_secs(5), async {
        while node.recv().await.is_some() {}
    })
    .await
    .expect("channel should close after stop");
}

#[tokio::test]
async fn inbound_stop_closes_the_subscription_before_returning() {
    let mut bus = PubSocket::new();
    let endpoint = bus.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

    let mut node = InboundNode::new(
        InboundConfig { tag: "BRK1".into(), updates: false, endpoint },
        CaptureSink::new(),
    )
    .unwrap();
    node.start().await.unwrap();
    broadcast_until_received(&mut bus, &mut node, &status_envelope("BRK1", 1.0)).await;

    node.stop().await.unwrap();

    // The socket is already closed when stop returns, so this broadcast can
    // never surface; the queue holds pre-stop values only, then closes.
    broadcast(&mut bus, &status_envelope("BRK1", 9.0)).await;
    timeout(Duration::from_secs(5), async {
        while let Some(msg) = node.recv().await {
            assert_ne!(msg.payload, json!(9.0), "emitted after stop returned");
        }
    })
    .await
    .expect("channel should close after stop");
}

#[tokio::test]
async fn inbound_relays_updates_when_enabled() {
    let mut bus = PubSocket::new();
    let endpoint = bus.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

    let mut node = InboundNode::new(
        InboundConfig { tag: "BRK1".into(), updates: true, endpoint },
        CaptureSink::new(),
    )
    .unwrap();
    node.start().await.unwrap();

    let msg = broadcast_until_received(&mut bus, &mut node, &update_envelope("BRK1", 0.0)).await;
    assert_eq!(msg.topic, None);
    assert_eq!(msg.payload, json!(0.0));

    node.stop().await.unwrap();
}

#[tokio::test]
async fn inbound_ignores_updates_when_disabled() {
    let mut bus = PubSocket::new();
    let endpoint = bus.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

    let mut node = InboundNode::new(
        InboundConfig { tag: "BRK1".into(), updates: false, endpoint },
        CaptureSink::new(),
    )
    .unwrap();
    node.start().await.unwrap();

    // Confirm the subscription is live, then flush handshake-era duplicates.
    broadcast_until_received(&mut bus, &mut node, &status_envelope("BRK1", 1.0)).await;
    drain(&mut node).await;

    // An update followed by a status sentinel on the same connection: if the
    // update were relayed it would arrive first.
    broadcast(&mut bus, &update_envelope("BRK1", 7.0)).await;
    broadcast(&mut bus, &status_envelope("BRK1", 2.0)).await;

    let msg = timeout(Duration::from_secs(5), node.recv())
        .await
        .expect("sentinel within deadline")
        .unwrap();
    assert_eq!(msg.topic.as_deref(), Some("BRK1"));
    assert_eq!(msg.payload, json!(2.0));

    node.stop().await.unwrap();
}

#[tokio::test]
async fn outbound_transmits_one_update_record() {
    let mut collector = PullSocket::new();
    let endpoint = collector.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

    let sink = CaptureSink::new();
    let mut node = OutboundNode::new(
        OutboundConfig { tag: "BRK1".into(), endpoint },
        sink.clone(),
    )
    .unwrap();
    node.start().await.unwrap();
    sleep(Duration::from_millis(100)).await;

    node.publish(&json!("0")).await.unwrap();

    let msg = timeout(Duration::from_secs(5), collector.recv())
        .await
        .expect("update within deadline")
        .unwrap();
    assert_eq!(msg.get(0).map(|f| f.as_ref()), Some(TOPIC.as_bytes()));

    let env = Envelope::decode(msg.get(1).expect("payload frame")).unwrap();
    assert_eq!(env.version, "v1");
    assert_eq!(env.kind, Kind::Update);
    assert_eq!(env.metadata.get("sender").map(String::as_str), Some("Node-Red"));
    let update = env.update().unwrap();
    assert_eq!(update.updates, vec![Point { tag: "BRK1".into(), value: 0.0, ts: None }]);

    assert_eq!(
        sink.texts(),
        vec!["idle".to_string(), "updating".to_string(), "idle".to_string()]
    );

    node.stop().await.unwrap();
}

#[tokio::test]
async fn outbound_drops_non_numeric_input_silently() {
    let mut collector = PullSocket::new();
    let endpoint = collector.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

    let sink = CaptureSink::new();
    let mut node = OutboundNode::new(
        OutboundConfig { tag: "BRK1".into(), endpoint },
        sink.clone(),
    )
    .unwrap();
    node.start().await.unwrap();
    sleep(Duration::from_millis(100)).await;

    node.publish(&json!("abc")).await.unwrap();
    node.publish(&json!(null)).await.unwrap();
    node.publish(&json!("")).await.unwrap();

    assert!(
        timeout(Duration::from_millis(300), collector.recv()).await.is_err(),
        "nothing should have been transmitted"
    );
    // No updating/idle toggles either: the drops happen before the send path.
    assert_eq!(sink.texts(), vec!["idle".to_string()]);

    node.stop().await.unwrap();
}
