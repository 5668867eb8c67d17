//! Thin wrappers around the two bus socket roles.
//!
//! The message bus is ZeroMQ: modules receive broadcasts from the bus's PUB
//! side and hand updates to its PULL side. Every frame pair is
//! `(topic, payload)`; both roles here speak the fixed broadcast topic.

use bytes::Bytes;
use flow_node::node::NodeError;
use zeromq::{PushSocket, Socket, SocketRecv, SocketSend, SubSocket, ZmqError, ZmqMessage};

/// Topic shared by every module on the simulation bus.
pub const TOPIC: &str = "RUNTIME";

/// Subscribe side: one SUB socket, connected once, never reopened.
pub struct Subscriber {
    socket: SubSocket,
}

impl Subscriber {
    pub async fn connect(endpoint: &str) -> Result<Self, NodeError> {
        let mut socket = SubSocket::new();
        socket.connect(endpoint).await.map_err(|e| connect_error(endpoint, e))?;
        socket.subscribe(TOPIC).await.map_err(|e| connect_error(endpoint, e))?;
        Ok(Self { socket })
    }

    /// Next frame pair delivered by the bus. The payload frame goes to the
    /// codec untouched; a missing frame comes back empty rather than erroring,
    /// the codec rejects it downstream.
    pub async fn recv(&mut self) -> Result<(String, Bytes), ZmqError> {
        let msg = self.socket.recv().await?;
        let topic = msg
            .get(0)
            .map(|frame| String::from_utf8_lossy(frame).into_owned())
            .unwrap_or_default();
        let payload = msg.get(1).cloned().unwrap_or_default();
        Ok((topic, payload))
    }

    pub async fn close(self) {
        self.socket.close().await;
    }
}

/// Update side: one PUSH socket. Closing drops any queued frames immediately,
/// which is the zero-linger teardown the bus convention asks for.
pub struct Pusher {
    socket: PushSocket,
}

impl Pusher {
    pub async fn connect(endpoint: &str) -> Result<Self, NodeError> {
        let mut socket = PushSocket::new();
        socket.connect(endpoint).await.map_err(|e| connect_error(endpoint, e))?;
        Ok(Self { socket })
    }

    /// Two-frame send: topic, then payload.
    pub async fn push(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ZmqError> {
        let mut msg = ZmqMessage::from(topic.to_string());
        msg.push_back(Bytes::from(payload));
        self.socket.send(msg).await
    }

    pub async fn close(self) {
        self.socket.close().await;
    }
}

fn connect_error(endpoint: &str, err: ZmqError) -> NodeError {
    NodeError::Connect { endpoint: endpoint.to_string(), reason: err.to_string() }
}
