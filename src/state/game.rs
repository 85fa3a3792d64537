use std::{fmt, str::FromStr, time::Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{MediaEntity, QuestionEntity};

/// Identity of a transport connection; doubles as the player identity.
pub type ConnectionId = Uuid;
/// Identifier of a question record in the question bank.
pub type QuestionId = u64;
/// Identifier of a quiz in the question bank.
pub type QuizId = u64;
/// Monotonic identifier of a round within one process.
pub type RoundId = u64;

/// One of the four answer slots of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

/// Raised when a choice letter is not one of `A`, `B`, `C`, `D`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid choice `{0}`, expected one of A, B, C, D")]
pub struct ParseChoiceError(pub String);

impl FromStr for Choice {
    type Err = ParseChoiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" | "a" => Ok(Choice::A),
            "B" | "b" => Ok(Choice::B),
            "C" | "c" => Ok(Choice::C),
            "D" | "d" => Ok(Choice::D),
            other => Err(ParseChoiceError(other.to_string())),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        };
        f.write_str(letter)
    }
}

/// Text displayed for each answer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOptions {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
}

/// Kind of media attached to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// Media resource displayed alongside a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub url: String,
    pub kind: MediaKind,
}

/// Full question record, including the correct answer.
///
/// Only admin connections may ever receive this form; players get the
/// projection built by [`crate::dto::game::PlayerQuestion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: AnswerOptions,
    pub correct_answer: Choice,
    /// Raw limit as supplied by the source; unset or non-positive falls back to the default.
    pub time_limit_seconds: Option<i64>,
    pub media: Option<Media>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

impl Question {
    /// Countdown length for a round showing this question.
    pub fn effective_time_limit(&self, default_secs: u32) -> u32 {
        match self.time_limit_seconds {
            Some(limit) if limit > 0 => u32::try_from(limit).unwrap_or(u32::MAX),
            _ => default_secs,
        }
    }
}

/// Ordered question list consumed in quiz mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    /// Absent for ad-hoc quizzes assembled from random questions.
    pub id: Option<QuizId>,
    pub name: String,
    pub questions: Vec<Question>,
}

/// Participant registered on a player connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ConnectionId,
    pub display_name: String,
    pub score: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
}

impl Player {
    /// Fresh player with a zeroed score.
    pub fn new(id: ConnectionId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            score: 0,
            questions_answered: 0,
            correct_answers: 0,
        }
    }
}

/// Answer recorded for the currently open round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub player_id: ConnectionId,
    /// Name captured at submission time so results survive a disconnect.
    pub player_name: String,
    pub question_id: QuestionId,
    pub choice: Choice,
    pub submitted_at: Instant,
}

impl From<MediaEntity> for Media {
    fn from(value: MediaEntity) -> Self {
        Self {
            url: value.url,
            kind: value.kind,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            prompt: value.question,
            options: AnswerOptions {
                a: value.option_a,
                b: value.option_b,
                c: value.option_c,
                d: value.option_d,
            },
            correct_answer: value.correct_answer,
            time_limit_seconds: value.time_limit,
            media: value.media.map(Into::into),
            category: value.category,
            difficulty: value.difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(limit: Option<i64>) -> Question {
        Question {
            id: 1,
            prompt: "2 + 2?".into(),
            options: AnswerOptions {
                a: "3".into(),
                b: "4".into(),
                c: "5".into(),
                d: "22".into(),
            },
            correct_answer: Choice::B,
            time_limit_seconds: limit,
            media: None,
            category: None,
            difficulty: None,
        }
    }

    #[test]
    fn time_limit_falls_back_to_default_when_unset_or_non_positive() {
        assert_eq!(question(None).effective_time_limit(30), 30);
        assert_eq!(question(Some(0)).effective_time_limit(30), 30);
        assert_eq!(question(Some(-5)).effective_time_limit(30), 30);
        assert_eq!(question(Some(12)).effective_time_limit(30), 12);
    }

    #[test]
    fn choice_parses_letters_case_insensitively() {
        assert_eq!("C".parse::<Choice>(), Ok(Choice::C));
        assert_eq!(" d ".parse::<Choice>(), Ok(Choice::D));
        assert!("E".parse::<Choice>().is_err());
        assert!("".parse::<Choice>().is_err());
    }
}
