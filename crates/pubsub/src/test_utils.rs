//! An in-memory [Connection] driven by the test, standing in for a node.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::transport::{Connection, Connector, TransportError};

pub const SUBSCRIPTION_ID: &str = "0xcd0c3e8af590364c09d0fa6a1210faf5";

/// Produces the frames the node answers a request with.
pub type Responder = Box<dyn FnMut(&Value) -> Vec<String> + Send>;

/// Acks every subscribe with [SUBSCRIPTION_ID] and every unsubscribe with
/// `unsubscribe_ack`.
pub fn ack_all(unsubscribe_ack: bool) -> Responder {
    Box::new(move |request| {
        let result = match request["method"].as_str() {
            Some("eth_subscribe") => json!(SUBSCRIPTION_ID),
            Some("eth_unsubscribe") => json!(unsubscribe_ack),
            other => panic!("Unexpected method {other:?}"),
        };
        vec![json!({"jsonrpc": "2.0", "id": request["id"], "result": result}).to_string()]
    })
}

type Frame = Result<String, TransportError>;

#[derive(Clone, Default)]
struct Shared {
    reads: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<Value>>>,
}

pub struct MockConnection {
    incoming: mpsc::UnboundedReceiver<Frame>,
    responses: mpsc::UnboundedSender<Frame>,
    responder: Responder,
    shared: Shared,
}

/// The node's side of a [MockConnection].
pub struct MockServer {
    frames: mpsc::UnboundedSender<Frame>,
    shared: Shared,
}

impl MockConnection {
    pub fn new(responder: Responder) -> (Self, MockServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Shared::default();

        let connection = Self {
            incoming: rx,
            responses: tx.clone(),
            responder,
            shared: shared.clone(),
        };
        let server = MockServer { frames: tx, shared };

        (connection, server)
    }
}

impl MockServer {
    pub fn push_frame(&self, frame: Value) {
        self.frames.send(Ok(frame.to_string())).unwrap();
    }

    /// Pushes a notification for [SUBSCRIPTION_ID].
    pub fn push_event(&self, result: Value) {
        self.push_frame(json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {"subscription": SUBSCRIPTION_ID, "result": result}
        }));
    }

    /// Makes the next read fail as if the node closed the socket.
    pub fn close(&self) {
        self.frames.send(Err(TransportError::Closed)).unwrap();
    }

    /// Number of text frames the client has read.
    pub fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Value> {
        self.shared.sent.lock().unwrap().clone()
    }

    pub fn sent_methods(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|request| request["method"].as_str().unwrap().to_owned())
            .collect()
    }
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let request: Value = serde_json::from_str(&frame).unwrap();
        self.shared.sent.lock().unwrap().push(request.clone());

        for response in (self.responder)(&request) {
            let _ = self.responses.send(Ok(response));
        }

        Ok(())
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        match self.incoming.recv().await {
            Some(Ok(frame)) => {
                self.shared.reads.fetch_add(1, Ordering::SeqCst);
                Ok(frame)
            }
            Some(Err(e)) => Err(e),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out the given connections in order, then refuses to connect.
pub struct MockConnector {
    connections: Mutex<VecDeque<MockConnection>>,
}

impl MockConnector {
    pub fn new(connections: impl IntoIterator<Item = MockConnection>) -> Self {
        Self {
            connections: Mutex::new(connections.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection, TransportError> {
        let connection = self.connections.lock().unwrap().pop_front();
        connection.ok_or_else(|| {
            tokio_tungstenite::tungstenite::Error::Io(std::io::ErrorKind::ConnectionRefused.into())
                .into()
        })
    }
}
