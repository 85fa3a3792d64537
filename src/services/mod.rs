/// Fan-out of session notifications to connections and spectators.
pub mod broadcast;
/// OpenAPI documentation generation.
pub mod documentation;
/// Session operations invoked by the gateway, plus the round countdown.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Server-Sent Events spectator stream.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
