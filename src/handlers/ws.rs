use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::{registry::ConnectionRegistry, AppState};

/// Prefix of the message fanned out for every text frame a client sends.
pub const ECHO_PREFIX: &str = "Received stock update: ";

/// Longest a single frame may take to reach a peer before it is treated as gone.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a connection's loop ended.
enum Disconnect {
    /// Close frame or end of stream from the client.
    Closed,
    /// The registry dropped this connection's outbox.
    Evicted,
    /// Writing to the socket failed; nothing more can be sent.
    SendFailed(String),
    /// Protocol or read error; the client gets told before the socket is closed.
    Failed(String),
}

/// GET /ws/stock
pub async fn stock_updates(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state.registry, peer))
}

/// Drives one upgraded connection: drains its outbox to the socket and turns
/// every inbound text frame into a broadcast to all live connections.
async fn run_connection(socket: WebSocket, registry: Arc<ConnectionRegistry>, peer: SocketAddr) {
    let (mut sink, mut stream) = socket.split();
    let (id, mut outbox) = registry.register().await;
    info!(connection = %id, %peer, "WebSocket connection accepted");

    let outcome = loop {
        tokio::select! {
            queued = outbox.recv() => match queued {
                Some(text) => {
                    if let Err(reason) = send_within(&mut sink, Message::Text(text), SEND_TIMEOUT).await {
                        break Disconnect::SendFailed(reason);
                    }
                }
                None => break Disconnect::Evicted,
            },

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    debug!(connection = %id, "Received stock data");
                    registry.broadcast(&format!("{}{}", ECHO_PREFIX, text)).await;
                }
                Some(Ok(Message::Binary(_))) => {
                    break Disconnect::Failed("binary frames are not supported".to_string());
                }
                Some(Ok(Message::Close(_))) | None => break Disconnect::Closed,
                // Ping/pong are answered by the protocol layer.
                Some(Ok(_)) => {}
                Some(Err(e)) => break Disconnect::Failed(e.to_string()),
            },
        }
    };

    registry.unregister(id).await;

    match outcome {
        Disconnect::Closed => {
            info!(connection = %id, %peer, "WebSocket client disconnected");
            // Flushes the close reply queued by the protocol layer.
            close_within(&mut sink, SEND_TIMEOUT).await;
        }
        Disconnect::Evicted => {
            warn!(connection = %id, %peer, "WebSocket client dropped by registry");
            close_within(&mut sink, SEND_TIMEOUT).await;
        }
        Disconnect::SendFailed(reason) => {
            warn!(connection = %id, %peer, error = %reason, "WebSocket send failed");
        }
        Disconnect::Failed(reason) => {
            let message = format!("An error occurred: {}", reason);
            error!(connection = %id, %peer, "{}", message);
            if send_within(&mut sink, Message::Text(message), SEND_TIMEOUT).await.is_ok() {
                close_within(&mut sink, SEND_TIMEOUT).await;
            }
        }
    }
}

/// Sends one frame, giving up after `limit` so a peer that stops reading cannot park the task.
async fn send_within<S>(sink: &mut S, msg: Message, limit: Duration) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match timeout(limit, sink.send(msg)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("send timed out after {:?}", limit)),
    }
}

async fn close_within<S>(sink: &mut S, limit: Duration)
where
    S: Sink<Message> + Unpin,
{
    let _ = timeout(limit, sink.close()).await;
}
