use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::models::SessionSummaryEntity,
    dto::{
        game::{GameStateSnapshot, QuizOverview, RandomQuizRequest},
        validation::validate_display_name,
        ws::ShowQuestionRequest,
    },
    error::ServiceError,
    services::broadcast::dispatch,
    state::{
        SharedState,
        game::{Choice, ConnectionId, Question, Quiz, QuizId, RoundId},
        session::{GameSession, RoundOpened, SnapshotView},
        state_machine::GameError,
        timer::RoundTimer,
    },
};

const RANDOM_QUIZ_NAME: &str = "Random quiz";

/// Register `connection_id` as a player under the trimmed display name.
///
/// Uniqueness is checked on the trimmed form, so `" Alice"` collides with `"Alice"`.
pub async fn join(
    state: &SharedState,
    connection_id: ConnectionId,
    display_name: &str,
) -> Result<(), ServiceError> {
    validate_display_name(display_name).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.to_string())
                .unwrap_or_else(|| err.code.to_string()),
        )
    })?;

    let mut session = state.session().lock().await;
    let notifications = session.join(connection_id, display_name.trim().to_string())?;
    dispatch(state, notifications);
    Ok(())
}

/// Drop a departed connection from the roster. Unknown connections are ignored.
pub async fn leave(state: &SharedState, connection_id: &ConnectionId) {
    let mut session = state.session().lock().await;
    let notifications = session.leave(connection_id);
    dispatch(state, notifications);
}

/// Begin a manual-mode game.
pub async fn start_game(state: &SharedState) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    let notifications = session.start_game(OffsetDateTime::now_utc())?;
    dispatch(state, notifications);
    Ok(())
}

/// Begin a quiz-mode game from a stored quiz.
pub async fn start_quiz(state: &SharedState, quiz_id: QuizId) -> Result<(), ServiceError> {
    ensure_idle(state).await?;

    let source = state.questions();
    let Some(quiz) = source.quiz_by_id(quiz_id).await? else {
        return Err(GameError::QuizNotFound(quiz_id).into());
    };
    let Some(questions) = source.quiz_questions(quiz_id).await? else {
        return Err(GameError::QuizNotFound(quiz_id).into());
    };

    let quiz = Quiz {
        id: Some(quiz.id),
        name: quiz.name,
        questions: questions.into_iter().map(Question::from).collect(),
    };
    begin_quiz(state, quiz).await
}

/// Begin a quiz-mode game over `count` randomly drawn questions.
pub async fn start_random_quiz(
    state: &SharedState,
    request: RandomQuizRequest,
) -> Result<(), ServiceError> {
    request.validate()?;
    ensure_idle(state).await?;

    let questions = state.questions().random_questions(request.count).await?;
    if questions.len() < request.count {
        debug!(
            requested = request.count,
            available = questions.len(),
            "question bank smaller than requested random quiz"
        );
    }

    let quiz = Quiz {
        id: None,
        name: RANDOM_QUIZ_NAME.to_string(),
        questions: questions.into_iter().map(Question::from).collect(),
    };
    begin_quiz(state, quiz).await
}

async fn begin_quiz(state: &SharedState, quiz: Quiz) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    let notifications = session.start_quiz(quiz, OffsetDateTime::now_utc())?;
    dispatch(state, notifications);
    Ok(())
}

/// Open a round for an inline question or one looked up by id.
pub async fn show_question(
    state: &SharedState,
    request: ShowQuestionRequest,
) -> Result<(), ServiceError> {
    let question = match request {
        ShowQuestionRequest::Full(dto) => {
            dto.validate()?;
            Question::from(*dto)
        }
        ShowQuestionRequest::ById { question_id } => {
            state.session().lock().await.ensure_can_open_round()?;
            state
                .questions()
                .question_by_id(question_id)
                .await?
                .map(Question::from)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("question `{question_id}` not found"))
                })?
        }
    };

    open_round(state, |session, opened_at| {
        session.show_question(question, opened_at)
    })
    .await
}

/// Open a round for the next question of the running quiz.
pub async fn show_next_quiz_question(state: &SharedState) -> Result<(), ServiceError> {
    open_round(state, |session, opened_at| {
        session.show_next_quiz_question(opened_at)
    })
    .await
}

async fn open_round<F>(state: &SharedState, open: F) -> Result<(), ServiceError>
where
    F: FnOnce(&mut GameSession, std::time::Instant) -> Result<RoundOpened, GameError>,
{
    let mut session = state.session().lock().await;
    let RoundOpened {
        round_id,
        time_limit_secs,
        notifications,
    } = open(&mut *session, Instant::now().into_std())?;
    dispatch(state, notifications);

    let timer = spawn_round_timer(state, round_id, time_limit_secs);
    session.attach_timer(round_id, timer);
    Ok(())
}

/// Start the countdown of `round_id`: one `timer_update` per tick, then an automatic close.
pub fn spawn_round_timer(state: &SharedState, round_id: RoundId, duration_secs: u32) -> RoundTimer {
    let tick_state = state.clone();
    let expire_state = state.clone();

    RoundTimer::start(
        duration_secs,
        state.config().tick_interval(),
        move |remaining| {
            let state = tick_state.clone();
            async move {
                let mut session = state.session().lock().await;
                let notifications = session.tick(round_id, remaining);
                dispatch(&state, notifications);
            }
        },
        move || async move {
            let mut session = expire_state.session().lock().await;
            let notifications = session.expire_round(round_id);
            if !notifications.is_empty() {
                info!(round = round_id, "countdown expired; question closed");
            }
            dispatch(&expire_state, notifications);
        },
    )
}

/// Close the open round on admin request.
pub async fn end_question(state: &SharedState) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    let notifications = session.end_question()?;
    dispatch(state, notifications);
    Ok(())
}

/// End the game, broadcast standings and hand the summary to the session sink.
pub async fn end_game(state: &SharedState) {
    let summary = {
        let mut session = state.session().lock().await;
        let ended = session.end_game(OffsetDateTime::now_utc());
        dispatch(state, ended.notifications);
        ended.summary
    };

    if let Some(summary) = summary {
        persist_summary(state, summary);
    }
}

fn persist_summary(state: &SharedState, summary: SessionSummaryEntity) {
    let Some(sink) = state.sink() else {
        debug!(session = %summary.id, "no session sink configured; summary dropped");
        return;
    };

    tokio::spawn(async move {
        let id = summary.id;
        match sink.save_session(summary).await {
            Ok(()) => info!(session = %id, "session summary saved"),
            Err(err) => warn!(session = %id, error = %err, "failed to save session summary"),
        }
    });
}

/// Record a player's answer. The receipt time is taken before waiting on the session lock.
pub async fn submit_answer(
    state: &SharedState,
    connection_id: ConnectionId,
    choice: &str,
) -> Result<(), ServiceError> {
    let submitted_at = Instant::now().into_std();
    let choice: Choice = choice.parse()?;

    let mut session = state.session().lock().await;
    let notifications = session.submit_answer(connection_id, choice, submitted_at)?;
    dispatch(state, notifications);
    Ok(())
}

/// Current snapshot in the requested projection.
pub async fn game_state(state: &SharedState, view: SnapshotView) -> GameStateSnapshot {
    state.session().lock().await.snapshot(view)
}

/// Describe a stored quiz without touching the live session.
pub async fn quiz_overview(
    state: &SharedState,
    quiz_id: QuizId,
) -> Result<QuizOverview, ServiceError> {
    let quiz = state
        .questions()
        .quiz_by_id(quiz_id)
        .await?
        .ok_or(GameError::QuizNotFound(quiz_id))?;

    Ok(QuizOverview {
        quiz_id: quiz.id,
        name: quiz.name,
        total_questions: quiz.question_ids.len(),
    })
}

/// Whether a game is currently running.
pub async fn is_active(state: &SharedState) -> bool {
    state.session().lock().await.is_active()
}

/// Reject early, before any question source I/O, when a game is already running.
async fn ensure_idle(state: &SharedState) -> Result<(), ServiceError> {
    state.session().lock().await.ensure_idle()?;
    Ok(())
}
