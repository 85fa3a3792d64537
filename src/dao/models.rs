use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::game::{Choice, MediaKind, QuestionId, QuizId};

/// Question record as stored in the question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: QuestionId,
    /// Prompt displayed to players.
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// Letter of the correct option.
    pub correct_answer: Choice,
    /// Countdown in seconds; missing or non-positive values use the configured default.
    #[serde(default)]
    pub time_limit: Option<i64>,
    #[serde(default)]
    pub media: Option<MediaEntity>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Media attachment of a stored question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaEntity {
    pub url: String,
    pub kind: MediaKind,
}

/// Quiz definition: a named, ordered list of question identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Stable identifier for the quiz.
    pub id: QuizId,
    /// Human readable quiz name.
    pub name: String,
    /// Question identifiers in play order.
    pub question_ids: Vec<QuestionId>,
}

/// Summary of a finished game handed to the persistence sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummaryEntity {
    /// Identifier generated when the summary is built.
    pub id: Uuid,
    /// RFC 3339 timestamp of `start_game` / `start_quiz`.
    pub started_at: String,
    /// RFC 3339 timestamp of `end_game`.
    pub ended_at: String,
    /// Quiz that drove the game, if it was started from a stored quiz.
    pub quiz_id: Option<QuizId>,
    pub total_players: usize,
    /// Number of rounds closed during the game.
    pub total_questions: usize,
    pub winner_name: Option<String>,
    pub winner_score: Option<u32>,
    /// Final standings, best first.
    pub players: Vec<PlayerResultEntity>,
}

/// Final result of one player inside a [`SessionSummaryEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerResultEntity {
    pub player_name: String,
    pub final_score: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
}
