use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::game::{GameStateSnapshot, QuizOverview},
    error::AppError,
    services::game_service,
    state::{SharedState, game::QuizId, session::SnapshotView},
};

/// Read-only view of the live session and the stored quizzes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game/state", get(game_state))
        .route("/quizzes/{quiz_id}", get(quiz_overview))
}

/// Player-safe snapshot of the session, for clients bootstrapping over HTTP.
#[utoipa::path(
    get,
    path = "/game/state",
    tag = "game",
    responses(
        (status = 200, description = "Current game state", body = GameStateSnapshot)
    )
)]
pub async fn game_state(State(state): State<SharedState>) -> Json<GameStateSnapshot> {
    Json(game_service::game_state(&state, SnapshotView::PlayerSafe).await)
}

#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}",
    tag = "game",
    params(("quiz_id" = u64, Path, description = "Stored quiz identifier")),
    responses(
        (status = 200, description = "Quiz name and length", body = QuizOverview),
        (status = 404, description = "Unknown quiz"),
        (status = 503, description = "Question source unavailable")
    )
)]
/// Name and question count of a stored quiz, so an admin can check it before `start_quiz`.
pub async fn quiz_overview(
    State(state): State<SharedState>,
    Path(quiz_id): Path<QuizId>,
) -> Result<Json<QuizOverview>, AppError> {
    let payload = game_service::quiz_overview(&state, quiz_id).await?;
    Ok(Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{http::StatusCode, response::IntoResponse};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{QuestionEntity, QuizEntity},
            question_store::memory::{MemoryQuestionStore, QuestionBank},
        },
        state::{AppState, game::Choice},
    };

    fn state() -> SharedState {
        let question = QuestionEntity {
            id: 1,
            question: "Capital of France?".into(),
            option_a: "Paris".into(),
            option_b: "Lyon".into(),
            option_c: "Nice".into(),
            option_d: "Lille".into(),
            correct_answer: Choice::A,
            time_limit: None,
            media: None,
            category: None,
            difficulty: None,
        };
        let store = MemoryQuestionStore::from_bank(QuestionBank {
            questions: vec![question],
            quizzes: vec![QuizEntity {
                id: 4,
                name: "Capitals".into(),
                question_ids: vec![1],
            }],
        })
        .unwrap();
        AppState::new(AppConfig::default(), Arc::new(store), None)
    }

    #[tokio::test]
    async fn known_quiz_is_described() {
        let Json(overview) = quiz_overview(State(state()), Path(4)).await.unwrap();
        assert_eq!(overview.quiz_id, 4);
        assert_eq!(overview.name, "Capitals");
        assert_eq!(overview.total_questions, 1);
    }

    #[tokio::test]
    async fn unknown_quiz_answers_not_found() {
        let err = quiz_overview(State(state()), Path(99)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
