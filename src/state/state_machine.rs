use std::time::Instant;

use indexmap::IndexMap;
use thiserror::Error;
use time::OffsetDateTime;

use crate::state::{
    game::{AnswerSubmission, ConnectionId, Question, QuizId, RoundId},
    timer::RoundTimer,
};

/// High-level phases the session can be in.
///
/// A closed round is never stored: closing a round moves straight back to
/// `Active` with no round, or to `Idle` when the game ends.
#[derive(Debug, Default)]
pub enum GamePhase {
    /// No game is running; players may still join.
    #[default]
    Idle,
    /// A game is running, with or without a live round.
    Active(ActiveGame),
}

/// Data carried while a game is running.
#[derive(Debug)]
pub struct ActiveGame {
    pub mode: GameMode,
    /// Present only while a question is live.
    pub round: Option<Round>,
    /// Wall-clock start, recorded for the session summary.
    pub started_at: OffsetDateTime,
    /// Number of rounds closed so far.
    pub rounds_closed: usize,
}

impl ActiveGame {
    pub fn new(mode: GameMode, started_at: OffsetDateTime) -> Self {
        Self {
            mode,
            round: None,
            started_at,
            rounds_closed: 0,
        }
    }

    /// Quiz context when the game runs in quiz mode.
    pub fn quiz(&self) -> Option<&QuizContext> {
        match &self.mode {
            GameMode::Quiz(context) => Some(context),
            GameMode::Manual => None,
        }
    }
}

/// How questions reach the running game.
#[derive(Debug)]
pub enum GameMode {
    /// The admin supplies each question.
    Manual,
    /// The admin advances through a fixed ordered list.
    Quiz(QuizContext),
}

/// Progress through the quiz driving a quiz-mode game.
#[derive(Debug)]
pub struct QuizContext {
    pub quiz_id: Option<QuizId>,
    pub name: String,
    pub questions: Vec<Question>,
    /// Index of the next question to show.
    pub next_index: usize,
}

impl QuizContext {
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_index >= self.questions.len()
    }
}

/// 1-based position of a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizPosition {
    pub number: usize,
    pub total: usize,
}

/// The question currently live. Exists only while the round is open.
#[derive(Debug)]
pub struct Round {
    pub id: RoundId,
    pub question: Question,
    pub started_at: Instant,
    pub time_limit_secs: u32,
    pub seconds_remaining: u32,
    pub position: Option<QuizPosition>,
    /// At most one submission per player, in arrival order.
    pub submissions: IndexMap<ConnectionId, AnswerSubmission>,
    pub timer: Option<RoundTimer>,
}

impl Round {
    pub fn new(
        id: RoundId,
        question: Question,
        started_at: Instant,
        time_limit_secs: u32,
        position: Option<QuizPosition>,
    ) -> Self {
        Self {
            id,
            question,
            started_at,
            time_limit_secs,
            seconds_remaining: time_limit_secs,
            position,
            submissions: IndexMap::new(),
            timer: None,
        }
    }
}

/// Why a round closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The admin sent `end_question`.
    Manual,
    /// The countdown reached zero.
    Expired,
}

/// Operations rejected by the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the name `{0}` is already taken")]
    NameTaken(String),
    #[error("this connection has already joined")]
    AlreadyJoined,
    #[error("a game is already active")]
    AlreadyActive,
    #[error("the game is not active")]
    GameNotActive,
    #[error("no quiz is active")]
    NoActiveQuiz,
    #[error("a question is already open; end it first")]
    RoundAlreadyOpen,
    #[error("all quiz questions have been shown")]
    QuizExhausted,
    #[error("no question is open")]
    NoOpenRound,
    #[error("player not found")]
    PlayerNotFound,
    #[error("quiz `{0}` not found")]
    QuizNotFound(QuizId),
    #[error("the quiz has no questions")]
    QuizEmpty,
    #[error("an answer was already submitted for this question")]
    AlreadyAnswered,
}
