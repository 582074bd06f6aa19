use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt, stream::SplitStream};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::state::{PlayerConnection, PlayerId, PlayerRole, Session, SharedState};

/// Placeholder name for players joining through the public endpoint.
pub const UNNAMED_PLAYER: &str = "[NO NAME]";

/// Reasons an admin handshake frame is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("handshake is not a decimal player id: `{0}`")]
    Malformed(String),
}

/// Parse the first frame of an admin socket into a player id.
pub fn parse_player_id(raw: &str) -> Result<PlayerId, HandshakeError> {
    raw.trim()
        .parse::<PlayerId>()
        .map_err(|_| HandshakeError::Malformed(raw.to_string()))
}

/// Socket halves plus the writer task feeding the sink.
struct SocketParts {
    receiver: SplitStream<WebSocket>,
    outbound_tx: mpsc::UnboundedSender<Message>,
    writer_task: JoinHandle<()>,
}

fn split_socket(socket: WebSocket) -> SocketParts {
    let (mut sender, receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sender.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    SocketParts {
        receiver,
        outbound_tx,
        writer_task,
    }
}

/// Handle a player joining through `/join/{activeGameId}`.
///
/// The player is only registered once the upgrade has succeeded.
pub async fn handle_player_socket(session: Arc<Session>, socket: WebSocket) {
    let SocketParts {
        receiver,
        outbound_tx,
        writer_task,
    } = split_socket(socket);

    let player_id = match session.add_player(UNNAMED_PLAYER, PlayerRole::Player).await {
        Ok(id) => id,
        Err(err) => {
            warn!(session = %session.code(), error = %err, "rejecting player connection");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let connection = PlayerConnection::new(outbound_tx.clone());
    if let Err(err) = session
        .initialize_connection(player_id, PlayerRole::Player, connection.clone())
        .await
    {
        warn!(session = %session.code(), player_id, error = %err, "rejecting player connection");
        let _ = outbound_tx.send(Message::Close(None));
        drop(connection);
        finalize(writer_task, outbound_tx).await;
        return;
    }
    info!(session = %session.code(), player_id, "player connected");

    pump_inbound(&session, player_id, receiver, &outbound_tx).await;

    session.detach_connection(player_id, connection.id()).await;
    drop(connection);
    info!(session = %session.code(), player_id, "player disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Handle the host joining through `/admin/join/{activeGameId}`.
///
/// The first text frame must carry the player id obtained from the admin page.
pub async fn handle_admin_socket(state: SharedState, session: Arc<Session>, socket: WebSocket) {
    let SocketParts {
        mut receiver,
        outbound_tx,
        writer_task,
    } = split_socket(socket);

    let handshake =
        match tokio::time::timeout(state.config().handshake_timeout(), receiver.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(Some(Ok(Message::Close(_)))) => {
                finalize(writer_task, outbound_tx).await;
                return;
            }
            Ok(Some(Ok(_))) => {
                warn!(session = %session.code(), "admin handshake was not a text frame");
                let _ = outbound_tx.send(Message::Close(None));
                finalize(writer_task, outbound_tx).await;
                return;
            }
            Ok(Some(Err(err))) => {
                warn!(session = %session.code(), error = %err, "websocket receive error");
                finalize(writer_task, outbound_tx).await;
                return;
            }
            Ok(None) | Err(_) => {
                warn!(session = %session.code(), "admin handshake timed out");
                finalize(writer_task, outbound_tx).await;
                return;
            }
        };

    let player_id = match parse_player_id(handshake.as_str()) {
        Ok(id) => id,
        Err(err) => {
            warn!(session = %session.code(), error = %err, "rejecting admin connection");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let connection = PlayerConnection::new(outbound_tx.clone());
    if let Err(err) = session
        .initialize_connection(player_id, PlayerRole::Admin, connection.clone())
        .await
    {
        warn!(session = %session.code(), player_id, error = %err, "rejecting admin connection");
        let _ = outbound_tx.send(Message::Close(None));
        drop(connection);
        finalize(writer_task, outbound_tx).await;
        return;
    }
    info!(session = %session.code(), player_id, "host connected");

    pump_inbound(&session, player_id, receiver, &outbound_tx).await;

    session.detach_connection(player_id, connection.id()).await;
    drop(connection);
    info!(session = %session.code(), player_id, "host disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Read inbound frames until the client leaves or the session closes.
async fn pump_inbound(
    session: &Session,
    player_id: PlayerId,
    mut receiver: SplitStream<WebSocket>,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) {
    let shutdown = session.shutdown_token();

    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = receiver.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                debug!(session = %session.code(), player_id, payload = %text.as_str(), "ignoring inbound message");
            }
            Some(Ok(Message::Ping(payload))) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Some(Ok(Message::Close(frame))) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {}
            Some(Err(err)) => {
                warn!(session = %session.code(), player_id, error = %err, "websocket error");
                break;
            }
            None => break,
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
