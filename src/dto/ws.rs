use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::game::{
        AnswerReceipt, FinalStandings, GameStateSnapshot, JoinSuccess, PlayerAnswered,
        PlayerQuestion, PlayerSummary, QuestionDto, QuestionResults, QuizCompleted, QuizStarted,
        RandomQuizRequest,
    },
    state::game::{QuestionId, QuizId},
};

/// Messages accepted from WebSocket clients, framed as `{"event": ..., "data": ...}`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register the connection as a player under the given display name.
    PlayerJoin(String),
    StartGame,
    StartQuiz { quiz_id: QuizId },
    StartRandomQuiz(RandomQuizRequest),
    ShowQuestion(ShowQuestionRequest),
    ShowNextQuizQuestion,
    /// Choice letter as typed by the client; validated server-side.
    SubmitAnswer { choice: String },
    EndQuestion,
    EndGame,
    GetGameState,
}

impl ClientMessage {
    /// Parse a raw text frame.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerJoin(_) => "player_join",
            Self::StartGame => "start_game",
            Self::StartQuiz { .. } => "start_quiz",
            Self::StartRandomQuiz(_) => "start_random_quiz",
            Self::ShowQuestion(_) => "show_question",
            Self::ShowNextQuizQuestion => "show_next_quiz_question",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::EndQuestion => "end_question",
            Self::EndGame => "end_game",
            Self::GetGameState => "get_game_state",
        }
    }

    /// Whether the command drives the game and is therefore reserved to admin connections.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::StartGame
                | Self::StartQuiz { .. }
                | Self::StartRandomQuiz(_)
                | Self::ShowQuestion(_)
                | Self::ShowNextQuizQuestion
                | Self::EndQuestion
                | Self::EndGame
        )
    }

    /// Whether the command only makes sense on a player connection.
    pub fn requires_player(&self) -> bool {
        matches!(self, Self::PlayerJoin(_) | Self::SubmitAnswer { .. })
    }
}

/// Question supplied with `show_question`: either inline or looked up in the question bank.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ShowQuestionRequest {
    ById { question_id: QuestionId },
    Full(Box<QuestionDto>),
}

/// Notifications pushed to WebSocket clients and the spectator stream.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    JoinSuccess(JoinSuccess),
    JoinError(String),
    PlayersUpdated(Vec<PlayerSummary>),
    GameStarted,
    QuizStarted(QuizStarted),
    QuizCompleted(QuizCompleted),
    GameEnded(FinalStandings),
    QuestionShown(PlayerQuestion),
    /// Seconds left on the countdown.
    TimerUpdate(u32),
    AnswerSubmitted(AnswerReceipt),
    PlayerAnswered(PlayerAnswered),
    QuestionResults(QuestionResults),
    ScoresUpdated(Vec<PlayerSummary>),
    GameState(GameStateSnapshot),
    Error(String),
}

impl ServerMessage {
    /// Wire name of the event, also used as the SSE event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinSuccess(_) => "join_success",
            Self::JoinError(_) => "join_error",
            Self::PlayersUpdated(_) => "players_updated",
            Self::GameStarted => "game_started",
            Self::QuizStarted(_) => "quiz_started",
            Self::QuizCompleted(_) => "quiz_completed",
            Self::GameEnded(_) => "game_ended",
            Self::QuestionShown(_) => "question_shown",
            Self::TimerUpdate(_) => "timer_update",
            Self::AnswerSubmitted(_) => "answer_submitted",
            Self::PlayerAnswered(_) => "player_answered",
            Self::QuestionResults(_) => "question_results",
            Self::ScoresUpdated(_) => "scores_updated",
            Self::GameState(_) => "game_state",
            Self::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unit_and_payload_commands() {
        assert!(matches!(
            ClientMessage::from_json_str(r#"{"event":"start_game"}"#).unwrap(),
            ClientMessage::StartGame
        ));
        match ClientMessage::from_json_str(r#"{"event":"player_join","data":"Alice"}"#).unwrap() {
            ClientMessage::PlayerJoin(name) => assert_eq!(name, "Alice"),
            other => panic!("unexpected message {other:?}"),
        }
        match ClientMessage::from_json_str(r#"{"event":"start_quiz","data":{"quiz_id":4}}"#)
            .unwrap()
        {
            ClientMessage::StartQuiz { quiz_id } => assert_eq!(quiz_id, 4),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn show_question_accepts_id_or_full_record() {
        let by_id = ClientMessage::from_json_str(
            r#"{"event":"show_question","data":{"question_id":12}}"#,
        )
        .unwrap();
        assert!(matches!(
            by_id,
            ClientMessage::ShowQuestion(ShowQuestionRequest::ById { question_id: 12 })
        ));

        let full = ClientMessage::from_json_str(
            r#"{"event":"show_question","data":{"id":3,"prompt":"?","options":{"A":"1","B":"2","C":"3","D":"4"},"correct_answer":"C"}}"#,
        )
        .unwrap();
        match full {
            ClientMessage::ShowQuestion(ShowQuestionRequest::Full(question)) => {
                assert_eq!(question.id, 3)
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(ClientMessage::from_json_str(r#"{"event":"cheat"}"#).is_err());
    }

    #[test]
    fn server_messages_use_event_envelope() {
        let value = serde_json::to_value(ServerMessage::TimerUpdate(7)).unwrap();
        assert_eq!(value["event"], "timer_update");
        assert_eq!(value["data"], 7);

        let value = serde_json::to_value(ServerMessage::GameStarted).unwrap();
        assert_eq!(value["event"], "game_started");
        assert_eq!(
            ServerMessage::GameStarted.event_name(),
            value["event"].as_str().unwrap()
        );
    }

    #[test]
    fn admin_and_player_commands_are_classified() {
        assert!(ClientMessage::EndQuestion.requires_admin());
        assert!(!ClientMessage::GetGameState.requires_admin());
        assert!(!ClientMessage::GetGameState.requires_player());
        assert!(
            ClientMessage::SubmitAnswer {
                choice: "A".into()
            }
            .requires_player()
        );
    }
}
