//! Per-connection handler: decode client frames, feed the coordinator and
//! write its events back out.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use parley_common::{ConnectionId, SessionError};
use parley_session::{ClientEvent, CoordinatorHandle, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Handle a single WebSocket connection until it closes.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    coordinator: CoordinatorHandle,
    outbound_capacity: usize,
) {
    let connection_id = ConnectionId::new();
    let (mut sink, mut stream) = ws.split();

    // 1. Register our outbound queue.
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(outbound_capacity.max(1));
    if let Err(e) = coordinator.connect(connection_id.clone(), tx).await {
        tracing::warn!(peer = %addr, error = %e, "Coordinator unavailable");
        return;
    }

    tracing::info!(peer = %addr, connection = %connection_id, "Client connected");

    // 2. Forwarding loop.
    loop {
        tokio::select! {
            // Coordinator events → this client's WebSocket
            Some(event) = rx.recv() => {
                if sink.send(Message::Text(event.to_json().into())).await.is_err() {
                    break;
                }
            }

            // This client's WebSocket → coordinator
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match decode_event(&text) {
                        Ok(event) => {
                            if coordinator.send(connection_id.clone(), event).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::debug!(
                                connection = %connection_id,
                                error = %err,
                                "Rejected frame"
                            );
                            if let Some(message) = err.client_message() {
                                let reply = ServerEvent::Error { message };
                                if sink.send(Message::Text(reply.to_json().into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 3. Cleanup.
    tracing::info!(peer = %addr, connection = %connection_id, "Client disconnected");
    if let Err(e) = coordinator.disconnect(connection_id).await {
        tracing::debug!(error = %e, "Disconnect after coordinator stopped");
    }
}

/// Parse one text frame into a client event.
pub fn decode_event(text: &str) -> Result<ClientEvent, SessionError> {
    serde_json::from_str(text)
        .map_err(|e| SessionError::InvalidRequest(format!("malformed message: {e}")))
}
