use indexmap::IndexMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Opaque handle for one live WebSocket connection. Never reused.
pub type ConnectionId = Uuid;

/// Receiving half of a connection's outbound queue, drained by its socket task.
pub type Outbox = mpsc::Receiver<String>;

/// Messages a client may fall behind by before it is dropped as a slow consumer.
pub const OUTBOX_CAPACITY: usize = 64;

/// Live set of broadcast clients.
///
/// Each entry owns the sending half of that connection's bounded queue, so
/// `broadcast` only ever enqueues and can never be held up by a slow socket.
/// A connection whose queue is closed or full is evicted during the same
/// broadcast that observed the failure. Insertion order is the delivery order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<IndexMap<ConnectionId, mpsc::Sender<String>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection whose handshake has completed.
    pub async fn register(&self) -> (ConnectionId, Outbox) {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        let id = Uuid::new_v4();

        let mut connections = self.connections.write().await;
        connections.insert(id, tx);
        debug!(connection = %id, live = connections.len(), "Connection registered");

        (id, rx)
    }

    /// Returns `false` when the connection was already gone (e.g. evicted).
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let removed = connections.shift_remove(&id).is_some();
        debug!(connection = %id, removed, live = connections.len(), "Connection unregistered");
        removed
    }

    /// Enqueues `message` for every live connection and returns how many accepted it.
    pub async fn broadcast(&self, message: &str) -> usize {
        info!("Broadcasting: {}", message);

        let mut connections = self.connections.write().await;
        let mut delivered = 0;
        connections.retain(|id, tx| match tx.try_send(message.to_string()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(connection = %id, "Outbox full, dropping slow connection");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(connection = %id, "Outbox closed, dropping connection");
                false
            }
        });

        delivered
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
