use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::ServiceError,
    services::{broadcast::send_message_to_websocket, game_service},
    state::{
        ClientConnection, ConnectionRole, SharedState, game::ConnectionId, session::SnapshotView,
    },
};

/// Handle the full lifecycle of a player or admin WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket, role: ConnectionRole) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = register(&state, role, outbound_tx.clone());

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_text(&state, connection_id, role, text.as_str()).await;
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                debug!(connection = %connection_id, "client sent close frame");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {
                debug!(connection = %connection_id, "ignoring binary frame");
            }
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    disconnect(&state, &connection_id).await;
    finalize(writer_task, outbound_tx).await;
}

/// Track a new connection and hand out its identity.
pub fn register(
    state: &SharedState,
    role: ConnectionRole,
    tx: mpsc::UnboundedSender<Message>,
) -> ConnectionId {
    let id = Uuid::new_v4();
    state
        .connections()
        .insert(id, ClientConnection { id, role, tx });
    info!(connection = %id, ?role, "client connected");
    id
}

/// Forget a connection; a player also leaves the roster. Safe to call twice.
pub async fn disconnect(state: &SharedState, connection_id: &ConnectionId) {
    let Some((_, connection)) = state.connections().remove(connection_id) else {
        return;
    };
    info!(connection = %connection_id, role = ?connection.role, "client disconnected");
    if connection.role == ConnectionRole::Player {
        game_service::leave(state, connection_id).await;
    }
}

/// Parse and execute one inbound text frame.
pub async fn handle_text(
    state: &SharedState,
    connection_id: ConnectionId,
    role: ConnectionRole,
    text: &str,
) {
    match ClientMessage::from_json_str(text) {
        Ok(message) => handle_message(state, connection_id, role, message).await,
        Err(err) => {
            warn!(connection = %connection_id, error = %err, "failed to parse client message");
            reply(
                state,
                &connection_id,
                &ServerMessage::Error(format!("invalid input: malformed message: {err}")),
            );
        }
    }
}

/// Execute a parsed command. Failures are reported to the originating connection only.
pub async fn handle_message(
    state: &SharedState,
    connection_id: ConnectionId,
    role: ConnectionRole,
    message: ClientMessage,
) {
    let event = message.name();
    let is_join = matches!(message, ClientMessage::PlayerJoin(_));
    debug!(connection = %connection_id, ?role, event, "received client message");

    if let Err(err) = route(state, connection_id, role, message).await {
        warn!(connection = %connection_id, event, error = %err, "operation rejected");
        let notice = if is_join {
            ServerMessage::JoinError(err.to_string())
        } else {
            ServerMessage::Error(err.to_string())
        };
        reply(state, &connection_id, &notice);
    }
}

async fn route(
    state: &SharedState,
    connection_id: ConnectionId,
    role: ConnectionRole,
    message: ClientMessage,
) -> Result<(), ServiceError> {
    authorize(role, &message)?;

    match message {
        ClientMessage::PlayerJoin(name) => game_service::join(state, connection_id, &name).await,
        ClientMessage::StartGame => game_service::start_game(state).await,
        ClientMessage::StartQuiz { quiz_id } => game_service::start_quiz(state, quiz_id).await,
        ClientMessage::StartRandomQuiz(request) => {
            game_service::start_random_quiz(state, request).await
        }
        ClientMessage::ShowQuestion(request) => game_service::show_question(state, request).await,
        ClientMessage::ShowNextQuizQuestion => game_service::show_next_quiz_question(state).await,
        ClientMessage::SubmitAnswer { choice } => {
            game_service::submit_answer(state, connection_id, &choice).await
        }
        ClientMessage::EndQuestion => game_service::end_question(state).await,
        ClientMessage::EndGame => {
            game_service::end_game(state).await;
            Ok(())
        }
        ClientMessage::GetGameState => {
            let view = match role {
                ConnectionRole::Admin => SnapshotView::Full,
                ConnectionRole::Player => SnapshotView::PlayerSafe,
            };
            let snapshot = game_service::game_state(state, view).await;
            reply(state, &connection_id, &ServerMessage::GameState(snapshot));
            Ok(())
        }
    }
}

fn authorize(role: ConnectionRole, message: &ClientMessage) -> Result<(), ServiceError> {
    match role {
        ConnectionRole::Player if message.requires_admin() => Err(ServiceError::Unauthorized(
            format!("`{}` is reserved to admin connections", message.name()),
        )),
        ConnectionRole::Admin if message.requires_player() => Err(ServiceError::Unauthorized(
            format!("`{}` is only accepted from player connections", message.name()),
        )),
        _ => Ok(()),
    }
}

fn reply(state: &SharedState, connection_id: &ConnectionId, message: &ServerMessage) {
    let Some(connection) = state.connections().get(connection_id) else {
        return;
    };
    let tx = connection.tx.clone();
    drop(connection);
    send_message_to_websocket(&tx, message, message.event_name());
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn players_cannot_drive_the_game() {
        assert!(matches!(
            authorize(ConnectionRole::Player, &ClientMessage::EndGame),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(authorize(ConnectionRole::Player, &ClientMessage::GetGameState).is_ok());
    }

    #[test]
    fn admins_cannot_join_or_answer() {
        assert!(matches!(
            authorize(ConnectionRole::Admin, &ClientMessage::PlayerJoin("Op".into())),
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(authorize(ConnectionRole::Admin, &ClientMessage::StartGame).is_ok());
    }
}
