use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::{
    game::{AnswerOptions, Choice, Media, MediaKind, Player, Question, QuestionId, QuizId},
    scoring::{PlayerOutcome, RoundResult},
    state_machine::QuizPosition,
};

/// Answer texts keyed by their letter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AnswerOptionsDto {
    #[serde(rename = "A")]
    #[validate(length(min = 1, max = 200))]
    pub a: String,
    #[serde(rename = "B")]
    #[validate(length(min = 1, max = 200))]
    pub b: String,
    #[serde(rename = "C")]
    #[validate(length(min = 1, max = 200))]
    pub c: String,
    #[serde(rename = "D")]
    #[validate(length(min = 1, max = 200))]
    pub d: String,
}

/// Media attachment as exchanged with clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct MediaDto {
    #[validate(url)]
    pub url: String,
    pub kind: MediaKind,
}

/// Full question form, correct answer included.
///
/// Accepted from admins in `show_question` and sent back to admins only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct QuestionDto {
    pub id: QuestionId,
    #[serde(alias = "question")]
    #[validate(length(min = 1, max = 500))]
    pub prompt: String,
    #[validate(nested)]
    pub options: AnswerOptionsDto,
    pub correct_answer: Choice,
    /// Unset or non-positive values fall back to the configured default.
    #[serde(default, alias = "time_limit")]
    #[validate(range(max = 600))]
    pub time_limit_seconds: Option<i64>,
    #[serde(default)]
    #[validate(nested)]
    pub media: Option<MediaDto>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Player-safe projection of the live question; never carries the correct answer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerQuestion {
    pub id: QuestionId,
    pub prompt: String,
    pub options: AnswerOptionsDto,
    /// Effective countdown for this round.
    pub time_limit_seconds: u32,
    pub media: Option<MediaDto>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// 1-based position in quiz mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
}

impl PlayerQuestion {
    /// Strip the correct answer from `question` for broadcast to players.
    pub fn project(question: &Question, time_limit_seconds: u32, position: Option<QuizPosition>) -> Self {
        Self {
            id: question.id,
            prompt: question.prompt.clone(),
            options: (&question.options).into(),
            time_limit_seconds,
            media: question.media.as_ref().map(Into::into),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            question_number: position.map(|p| p.number),
            total_questions: position.map(|p| p.total),
        }
    }
}

/// Question attached to a `game_state` snapshot, shaped for the receiving connection class.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum QuestionView {
    Full(QuestionDto),
    PlayerSafe(PlayerQuestion),
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a registered player.
pub struct PlayerSummary {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
}

/// Sent to a connection once its `player_join` succeeded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinSuccess {
    pub player_id: Uuid,
    pub player_name: String,
}

/// Payload of `start_random_quiz`.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct RandomQuizRequest {
    #[validate(range(min = 1, max = 50))]
    pub count: usize,
}

/// Broadcast when a quiz-mode game starts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizStarted {
    pub quiz_id: Option<QuizId>,
    pub name: String,
    pub total_questions: usize,
}

/// Stored quiz as listed to admins before starting it; answers are never included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizOverview {
    pub quiz_id: QuizId,
    pub name: String,
    pub total_questions: usize,
}

/// Broadcast when the last quiz round has been closed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizCompleted {
    pub quiz_id: Option<QuizId>,
    pub name: String,
    pub total_questions: usize,
}

/// Final standings broadcast by `game_ended`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FinalStandings {
    /// Players sorted by score, best first; ties keep join order.
    pub final_scores: Vec<PlayerSummary>,
    pub winner: Option<PlayerSummary>,
}

/// Receipt sent to the submitting player only.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerReceipt {
    pub question_id: QuestionId,
    pub choice: Choice,
}

/// Live feedback for admins whenever a player answers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerAnswered {
    pub player_id: Uuid,
    pub player_name: String,
    pub choice: Choice,
    pub response_time_ms: u64,
}

/// Outcome of one submission in `question_results`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerResult {
    pub player_id: Uuid,
    pub player_name: String,
    pub choice: Choice,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub points_earned: u32,
}

/// Scored round broadcast when a question closes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionResults {
    pub question_id: QuestionId,
    pub correct_answer: Choice,
    pub answers: Vec<PlayerResult>,
    pub correct_count: usize,
    pub total_answered: usize,
}

/// Coarse phase reported in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Active,
    QuestionLive,
}

/// Progress through the quiz driving the current game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizProgress {
    pub quiz_id: Option<QuizId>,
    pub name: String,
    /// Index of the next question to show (equals the number already shown).
    pub next_index: usize,
    pub total_questions: usize,
}

/// Full replayable view of the session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameStateSnapshot {
    pub is_active: bool,
    pub phase: PhaseKind,
    pub current_question: Option<QuestionView>,
    pub seconds_remaining: u32,
    pub players: Vec<PlayerSummary>,
    pub quiz: Option<QuizProgress>,
}

impl From<&AnswerOptions> for AnswerOptionsDto {
    fn from(value: &AnswerOptions) -> Self {
        Self {
            a: value.a.clone(),
            b: value.b.clone(),
            c: value.c.clone(),
            d: value.d.clone(),
        }
    }
}

impl From<&Media> for MediaDto {
    fn from(value: &Media) -> Self {
        Self {
            url: value.url.clone(),
            kind: value.kind,
        }
    }
}

impl From<&Question> for QuestionDto {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt.clone(),
            options: (&value.options).into(),
            correct_answer: value.correct_answer,
            time_limit_seconds: value.time_limit_seconds,
            media: value.media.as_ref().map(Into::into),
            category: value.category.clone(),
            difficulty: value.difficulty.clone(),
        }
    }
}

impl From<QuestionDto> for Question {
    fn from(value: QuestionDto) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt.trim().to_string(),
            options: AnswerOptions {
                a: value.options.a,
                b: value.options.b,
                c: value.options.c,
                d: value.options.d,
            },
            correct_answer: value.correct_answer,
            time_limit_seconds: value.time_limit_seconds,
            media: value.media.map(|media| Media {
                url: media.url,
                kind: media.kind,
            }),
            category: value.category,
            difficulty: value.difficulty,
        }
    }
}

impl From<&Player> for PlayerSummary {
    fn from(value: &Player) -> Self {
        Self {
            id: value.id,
            name: value.display_name.clone(),
            score: value.score,
        }
    }
}

impl From<PlayerOutcome> for PlayerResult {
    fn from(value: PlayerOutcome) -> Self {
        Self {
            player_id: value.player_id,
            player_name: value.player_name,
            choice: value.choice,
            is_correct: value.is_correct,
            response_time_ms: value.response_time_ms,
            points_earned: value.points_earned,
        }
    }
}

impl From<RoundResult> for QuestionResults {
    fn from(value: RoundResult) -> Self {
        Self {
            question_id: value.question_id,
            correct_answer: value.correct_answer,
            answers: value.per_player.into_iter().map(Into::into).collect(),
            correct_count: value.correct_count,
            total_answered: value.total_answered,
        }
    }
}
