pub mod game;
pub mod registry;
pub mod scoring;
pub mod session;
mod sse;
pub mod state_machine;
pub mod timer;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};

use crate::{
    config::AppConfig,
    dao::question_store::{QuestionSource, SessionSink},
    state::{game::ConnectionId, session::GameSession},
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Connection class, fixed by the endpoint the socket was opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Player,
    Admin,
}

#[derive(Clone)]
/// Handle used to push messages to a connected client.
pub struct ClientConnection {
    pub id: ConnectionId,
    pub role: ConnectionRole,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the live session, open sockets and collaborators.
pub struct AppState {
    config: AppConfig,
    session: Mutex<GameSession>,
    connections: DashMap<ConnectionId, ClientConnection>,
    questions: Arc<dyn QuestionSource>,
    sink: Option<Arc<dyn SessionSink>>,
    spectators: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        questions: Arc<dyn QuestionSource>,
        sink: Option<Arc<dyn SessionSink>>,
    ) -> SharedState {
        Arc::new(Self {
            session: Mutex::new(GameSession::new(config.default_time_limit_secs())),
            connections: DashMap::new(),
            spectators: SseHub::new(config.spectator_capacity()),
            questions,
            sink,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The one game session of this process. All transitions run under this lock.
    pub fn session(&self) -> &Mutex<GameSession> {
        &self.session
    }

    /// Registry of open WebSocket connections keyed by their identifier.
    pub fn connections(&self) -> &DashMap<ConnectionId, ClientConnection> {
        &self.connections
    }

    pub fn questions(&self) -> Arc<dyn QuestionSource> {
        self.questions.clone()
    }

    /// Sink receiving finished-session summaries, when persistence is configured.
    pub fn sink(&self) -> Option<Arc<dyn SessionSink>> {
        self.sink.clone()
    }

    /// Broadcast hub feeding the spectator SSE stream.
    pub fn spectators(&self) -> &SseHub {
        &self.spectators
    }
}
