use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when the question source answers, "degraded" otherwise.
    pub status: String,
    /// Whether a game is currently running.
    pub game_active: bool,
    /// Number of open WebSocket connections (players and admins).
    pub connections: usize,
    /// Number of open spectator SSE streams.
    pub spectators: usize,
}

impl HealthResponse {
    /// Build a response from the probe outcome and live counters.
    pub fn new(
        source_healthy: bool,
        game_active: bool,
        connections: usize,
        spectators: usize,
    ) -> Self {
        let status = if source_healthy { "ok" } else { "degraded" };
        Self {
            status: status.to_string(),
            game_active,
            connections,
            spectators,
        }
    }
}
