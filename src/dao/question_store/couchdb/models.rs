use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dao::models::{
        MediaEntity, PlayerResultEntity, QuestionEntity, QuizEntity, SessionSummaryEntity,
    },
    state::game::{Choice, QuestionId, QuizId},
};

pub const QUESTION_PREFIX: &str = "question::";
pub const QUIZ_PREFIX: &str = "quiz::";
pub const SESSION_PREFIX: &str = "session::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchQuestionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub question: QuestionBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBody {
    pub question_id: QuestionId,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: Choice,
    #[serde(default)]
    pub time_limit: Option<i64>,
    #[serde(default)]
    pub media: Option<MediaEntity>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl CouchQuestionDocument {
    pub fn into_entity(self) -> QuestionEntity {
        let body = self.question;
        QuestionEntity {
            id: body.question_id,
            question: body.question,
            option_a: body.option_a,
            option_b: body.option_b,
            option_c: body.option_c,
            option_d: body.option_d,
            correct_answer: body.correct_answer,
            time_limit: body.time_limit,
            media: body.media,
            category: body.category,
            difficulty: body.difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchQuizDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub quiz_id: QuizId,
    pub name: String,
    /// Question identifiers in play order.
    pub question_ids: Vec<QuestionId>,
}

impl CouchQuizDocument {
    pub fn into_entity(self) -> QuizEntity {
        QuizEntity {
            id: self.quiz_id,
            name: self.name,
            question_ids: self.question_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSessionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub started_at: String,
    pub ended_at: String,
    pub quiz_id: Option<QuizId>,
    pub total_players: usize,
    pub total_questions: usize,
    pub winner_name: Option<String>,
    pub winner_score: Option<u32>,
    pub players: Vec<PlayerResultEntity>,
}

impl From<SessionSummaryEntity> for CouchSessionDocument {
    fn from(value: SessionSummaryEntity) -> Self {
        Self {
            id: session_doc_id(value.id),
            started_at: value.started_at,
            ended_at: value.ended_at,
            quiz_id: value.quiz_id,
            total_players: value.total_players,
            total_questions: value.total_questions,
            winner_name: value.winner_name,
            winner_score: value.winner_score,
            players: value.players,
        }
    }
}

pub fn question_doc_id(id: QuestionId) -> String {
    format!("{QUESTION_PREFIX}{id}")
}

pub fn quiz_doc_id(id: QuizId) -> String {
    format!("{QUIZ_PREFIX}{id}")
}

pub fn session_doc_id(id: Uuid) -> String {
    format!("{SESSION_PREFIX}{id}")
}
