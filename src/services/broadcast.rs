//! Fan-out of session notifications to sockets and the spectator stream.

use axum::extract::ws::Message;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dto::{sse::ServerEvent, ws::ServerMessage},
    state::{
        ConnectionRole, SharedState,
        session::{Audience, Notification},
    },
};

/// Deliver notifications in order. Never blocks: every send is a queue push.
pub fn dispatch(state: &SharedState, notifications: Vec<Notification>) {
    for notification in notifications {
        deliver(state, notification);
    }
}

fn deliver(state: &SharedState, Notification { audience, message }: Notification) {
    let payload = match serde_json::to_string(&message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(event = message.event_name(), error = %err, "failed to serialize notification");
            return;
        }
    };

    match audience {
        Audience::Connection(id) => {
            if let Some(connection) = state.connections().get(&id) {
                let _ = connection.tx.send(Message::Text(payload.into()));
            } else {
                debug!(connection = %id, event = message.event_name(), "target connection is gone");
            }
        }
        Audience::All | Audience::Players | Audience::Admins => {
            for connection in state.connections().iter() {
                if reaches(audience, connection.role) {
                    let _ = connection.tx.send(Message::Text(payload.clone().into()));
                }
            }
            if matches!(audience, Audience::All | Audience::Players) {
                send_spectator_event(state, &message);
            }
        }
    }
}

fn reaches(audience: Audience, role: ConnectionRole) -> bool {
    match audience {
        Audience::All => true,
        Audience::Players => role == ConnectionRole::Player,
        Audience::Admins => role == ConnectionRole::Admin,
        Audience::Connection(_) => false,
    }
}

/// Push the payload of `message` onto the spectator stream under its event name.
fn send_spectator_event(state: &SharedState, message: &ServerMessage) {
    let data = match serde_json::to_value(message) {
        Ok(mut value) => value
            .get_mut("data")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null),
        Err(err) => {
            warn!(event = message.event_name(), error = %err, "failed to serialize spectator event");
            return;
        }
    };

    match ServerEvent::json(Some(message.event_name().to_string()), &data) {
        Ok(event) => state.spectators().broadcast(event),
        Err(err) => {
            warn!(event = message.event_name(), error = %err, "failed to serialize spectator event")
        }
    }
}

/// Serialize a payload and push it onto a single connection's writer queue.
pub fn send_message_to_websocket<T>(tx: &mpsc::UnboundedSender<Message>, value: &T, context: &str)
where
    T: ?Sized + Serialize,
{
    match serde_json::to_string(value) {
        Ok(payload) => {
            let _ = tx.send(Message::Text(payload.into()));
        }
        Err(err) => warn!(error = %err, context, "failed to serialize websocket message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audiences_select_connection_classes() {
        assert!(reaches(Audience::All, ConnectionRole::Player));
        assert!(reaches(Audience::All, ConnectionRole::Admin));
        assert!(reaches(Audience::Players, ConnectionRole::Player));
        assert!(!reaches(Audience::Players, ConnectionRole::Admin));
        assert!(reaches(Audience::Admins, ConnectionRole::Admin));
        assert!(!reaches(Audience::Admins, ConnectionRole::Player));
    }
}
