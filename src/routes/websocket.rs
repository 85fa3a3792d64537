use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{
    services::websocket_service,
    state::{ConnectionRole, SharedState},
};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "websocket",
    responses((status = 101, description = "Switching protocols to a player WebSocket session"))
)]
/// Upgrade the HTTP connection into a player WebSocket session.
pub async fn player_ws(State(state): State<SharedState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        websocket_service::handle_socket(state, socket, ConnectionRole::Player)
    })
}

#[utoipa::path(
    get,
    path = "/ws/admin",
    tag = "websocket",
    responses((status = 101, description = "Switching protocols to an admin WebSocket session"))
)]
/// Upgrade the HTTP connection into an admin (controller) WebSocket session.
pub async fn admin_ws(State(state): State<SharedState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket, ConnectionRole::Admin))
}

/// Configure the WebSocket endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/ws", get(player_ws))
        .route("/ws/admin", get(admin_ws))
}
