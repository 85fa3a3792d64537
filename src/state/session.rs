use std::time::Instant;

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{PlayerResultEntity, SessionSummaryEntity},
    dto::{
        format_timestamp,
        game::{
            AnswerReceipt, FinalStandings, GameStateSnapshot, JoinSuccess, PhaseKind,
            PlayerAnswered, PlayerQuestion, PlayerSummary, QuestionDto, QuestionView,
            QuizCompleted, QuizProgress, QuizStarted,
        },
        ws::ServerMessage,
    },
    state::{
        game::{AnswerSubmission, Choice, ConnectionId, Player, Question, Quiz, RoundId},
        registry::SessionRegistry,
        scoring::{self, RoundResult},
        state_machine::{
            ActiveGame, CloseReason, GameError, GameMode, GamePhase, QuizContext, QuizPosition,
            Round,
        },
        timer::RoundTimer,
    },
};

/// Recipients of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connection of both classes plus the spectator stream.
    All,
    /// Player connections and the spectator stream.
    Players,
    /// Admin connections only.
    Admins,
    /// A single connection.
    Connection(ConnectionId),
}

/// Message produced by a state transition, addressed to an audience.
#[derive(Debug, Clone)]
pub struct Notification {
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Notification {
    pub fn new(audience: Audience, message: ServerMessage) -> Self {
        Self { audience, message }
    }
}

/// Ordered notifications of one transition.
pub type Notifications = Vec<Notification>;

/// Which projection of the live question a snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotView {
    Full,
    PlayerSafe,
}

/// Outcome of opening a round; the caller arms the countdown for `round_id`.
#[derive(Debug)]
pub struct RoundOpened {
    pub round_id: RoundId,
    pub time_limit_secs: u32,
    pub notifications: Notifications,
}

/// Outcome of ending the game.
#[derive(Debug)]
pub struct GameEnded {
    pub notifications: Notifications,
    /// Present when a game was actually running.
    pub summary: Option<SessionSummaryEntity>,
}

/// The single live session: roster, phase, and the round in flight.
///
/// Every method runs synchronously; callers serialize access behind one lock
/// and deliver the returned notifications in order.
#[derive(Debug)]
pub struct GameSession {
    default_time_limit_secs: u32,
    registry: SessionRegistry,
    phase: GamePhase,
    next_round_id: RoundId,
}

impl GameSession {
    pub fn new(default_time_limit_secs: u32) -> Self {
        Self {
            default_time_limit_secs,
            registry: SessionRegistry::new(),
            phase: GamePhase::Idle,
            next_round_id: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, GamePhase::Active(_))
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Id of the open round, if any.
    pub fn open_round_id(&self) -> Option<RoundId> {
        self.active()
            .and_then(|game| game.round.as_ref())
            .map(|round| round.id)
    }

    /// Fail with `AlreadyActive` unless the session is idle.
    pub fn ensure_idle(&self) -> Result<(), GameError> {
        if self.is_active() {
            return Err(GameError::AlreadyActive);
        }
        Ok(())
    }

    /// Fail unless a game is running with no open round.
    pub fn ensure_can_open_round(&self) -> Result<(), GameError> {
        let game = self.active().ok_or(GameError::GameNotActive)?;
        if game.round.is_some() {
            return Err(GameError::RoundAlreadyOpen);
        }
        Ok(())
    }

    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        display_name: String,
    ) -> Result<Notifications, GameError> {
        let player = self.registry.join(connection_id, display_name)?;
        info!(player = %player.display_name, connection = %connection_id, "player joined");

        let success = JoinSuccess {
            player_id: player.id,
            player_name: player.display_name.clone(),
        };
        Ok(vec![
            Notification::new(
                Audience::Connection(connection_id),
                ServerMessage::JoinSuccess(success),
            ),
            self.players_updated(),
            Notification::new(
                Audience::Connection(connection_id),
                ServerMessage::GameState(self.snapshot(SnapshotView::PlayerSafe)),
            ),
        ])
    }

    /// Remove a player. Unknown connections produce no notifications.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Notifications {
        match self.registry.leave(connection_id) {
            Some(player) => {
                info!(player = %player.display_name, connection = %connection_id, "player left");
                vec![self.players_updated()]
            }
            None => Vec::new(),
        }
    }

    pub fn start_game(&mut self, started_at: OffsetDateTime) -> Result<Notifications, GameError> {
        self.ensure_idle()?;
        self.registry.reset_scores();
        self.phase = GamePhase::Active(ActiveGame::new(GameMode::Manual, started_at));
        info!(players = self.registry.len(), "game started");

        let mut notifications = vec![
            Notification::new(Audience::All, ServerMessage::GameStarted),
            self.scores_updated(),
        ];
        notifications.extend(self.state_notifications());
        Ok(notifications)
    }

    /// Start a game driven by `quiz`. The first question is not shown automatically.
    pub fn start_quiz(
        &mut self,
        quiz: Quiz,
        started_at: OffsetDateTime,
    ) -> Result<Notifications, GameError> {
        self.ensure_idle()?;
        if quiz.questions.is_empty() {
            return Err(GameError::QuizEmpty);
        }

        self.registry.reset_scores();
        let started = QuizStarted {
            quiz_id: quiz.id,
            name: quiz.name.clone(),
            total_questions: quiz.questions.len(),
        };
        let context = QuizContext {
            quiz_id: quiz.id,
            name: quiz.name,
            questions: quiz.questions,
            next_index: 0,
        };
        self.phase = GamePhase::Active(ActiveGame::new(GameMode::Quiz(context), started_at));
        info!(
            quiz = %started.name,
            questions = started.total_questions,
            players = self.registry.len(),
            "quiz started"
        );

        let mut notifications = vec![
            Notification::new(Audience::All, ServerMessage::QuizStarted(started)),
            self.scores_updated(),
        ];
        notifications.extend(self.state_notifications());
        Ok(notifications)
    }

    /// Open a round for an arbitrary question.
    pub fn show_question(
        &mut self,
        question: Question,
        opened_at: Instant,
    ) -> Result<RoundOpened, GameError> {
        self.ensure_can_open_round()?;
        Ok(self.open_round(question, opened_at, None))
    }

    /// Open a round for the next question of the running quiz.
    pub fn show_next_quiz_question(&mut self, opened_at: Instant) -> Result<RoundOpened, GameError> {
        let GamePhase::Active(game) = &mut self.phase else {
            return Err(GameError::NoActiveQuiz);
        };
        let has_round = game.round.is_some();
        let GameMode::Quiz(context) = &mut game.mode else {
            return Err(GameError::NoActiveQuiz);
        };
        if has_round {
            return Err(GameError::RoundAlreadyOpen);
        }
        if context.is_exhausted() {
            return Err(GameError::QuizExhausted);
        }

        let question = context.questions[context.next_index].clone();
        context.next_index += 1;
        let position = QuizPosition {
            number: context.next_index,
            total: context.total(),
        };
        Ok(self.open_round(question, opened_at, Some(position)))
    }

    fn open_round(
        &mut self,
        question: Question,
        opened_at: Instant,
        position: Option<QuizPosition>,
    ) -> RoundOpened {
        let round_id = self.next_round_id;
        self.next_round_id += 1;
        let time_limit_secs = question.effective_time_limit(self.default_time_limit_secs);
        let projected = PlayerQuestion::project(&question, time_limit_secs, position);
        info!(
            round = round_id,
            question = question.id,
            time_limit_secs,
            "question shown"
        );

        if let GamePhase::Active(game) = &mut self.phase {
            game.round = Some(Round::new(
                round_id,
                question,
                opened_at,
                time_limit_secs,
                position,
            ));
        }

        let mut notifications = vec![Notification::new(
            Audience::All,
            ServerMessage::QuestionShown(projected),
        )];
        notifications.extend(self.state_notifications());
        RoundOpened {
            round_id,
            time_limit_secs,
            notifications,
        }
    }

    /// Hand the countdown of `round_id` to its round.
    ///
    /// Returns `false` when that round is no longer open; the timer is then dropped, which cancels it.
    pub fn attach_timer(&mut self, round_id: RoundId, timer: RoundTimer) -> bool {
        match self.round_mut(round_id) {
            Some(round) => {
                if let Some(mut previous) = round.timer.replace(timer) {
                    previous.cancel();
                }
                true
            }
            None => false,
        }
    }

    /// Record a countdown tick. Ticks for a round that already closed are ignored.
    pub fn tick(&mut self, round_id: RoundId, seconds_remaining: u32) -> Notifications {
        match self.round_mut(round_id) {
            Some(round) => {
                round.seconds_remaining = seconds_remaining;
                vec![Notification::new(
                    Audience::All,
                    ServerMessage::TimerUpdate(seconds_remaining),
                )]
            }
            None => Vec::new(),
        }
    }

    /// Close the open round on admin request.
    pub fn end_question(&mut self) -> Result<Notifications, GameError> {
        let round = self
            .active_mut()
            .and_then(|game| game.round.take())
            .ok_or(GameError::NoOpenRound)?;
        Ok(self.close_round(round, CloseReason::Manual))
    }

    /// Close `round_id` because its countdown ran out.
    ///
    /// A no-op when that round was already closed by other means.
    pub fn expire_round(&mut self, round_id: RoundId) -> Notifications {
        let Some(game) = self.active_mut() else {
            return Vec::new();
        };
        if game.round.as_ref().map(|round| round.id) != Some(round_id) {
            debug!(round = round_id, "ignoring expiry of a closed round");
            return Vec::new();
        }
        match game.round.take() {
            Some(round) => self.close_round(round, CloseReason::Expired),
            None => Vec::new(),
        }
    }

    fn close_round(&mut self, mut round: Round, reason: CloseReason) -> Notifications {
        if let Some(mut timer) = round.timer.take() {
            match reason {
                CloseReason::Manual => {
                    timer.cancel();
                }
                // The expiry callback runs inside the timer task; aborting it would cut this transition short.
                CloseReason::Expired => timer.disarm(),
            }
        }

        let mut result = scoring::score(
            round.question.id,
            round.submissions.values(),
            round.question.correct_answer,
            round.started_at,
            round.time_limit_secs,
        );
        self.apply_result(&mut result);

        let quiz_done = match self.active_mut() {
            Some(game) => {
                game.rounds_closed += 1;
                game.quiz()
                    .filter(|context| context.is_exhausted())
                    .map(|context| QuizCompleted {
                        quiz_id: context.quiz_id,
                        name: context.name.clone(),
                        total_questions: context.total(),
                    })
            }
            None => None,
        };
        info!(
            round = round.id,
            question = result.question_id,
            ?reason,
            correct = result.correct_count,
            answered = result.total_answered,
            "question closed"
        );

        let mut notifications = vec![
            Notification::new(Audience::All, ServerMessage::QuestionResults(result.into())),
            self.scores_updated(),
        ];
        notifications.extend(self.state_notifications());
        if let Some(completed) = quiz_done {
            info!(quiz = %completed.name, "quiz completed");
            notifications.push(Notification::new(
                Audience::All,
                ServerMessage::QuizCompleted(completed),
            ));
        }
        notifications
    }

    /// Credit scored outcomes to players still registered; departed players keep their line but earn nothing.
    fn apply_result(&mut self, result: &mut RoundResult) {
        for outcome in &mut result.per_player {
            match self.registry.get_mut(&outcome.player_id) {
                Some(player) => {
                    player.score = player.score.saturating_add(outcome.points_earned);
                    player.questions_answered += 1;
                    if outcome.is_correct {
                        player.correct_answers += 1;
                    }
                }
                None => outcome.points_earned = 0,
            }
        }
    }

    /// Stop the game and compute final standings. Ending while idle only rebroadcasts standings.
    pub fn end_game(&mut self, ended_at: OffsetDateTime) -> GameEnded {
        let finished = match std::mem::take(&mut self.phase) {
            GamePhase::Active(mut game) => {
                if let Some(mut timer) = game.round.as_mut().and_then(|round| round.timer.take()) {
                    timer.cancel();
                }
                Some(game)
            }
            GamePhase::Idle => None,
        };

        let standings = self.registry.standings();
        let final_scores: Vec<PlayerSummary> = standings.iter().map(Into::into).collect();
        let winner = final_scores.first().cloned();
        info!(
            players = final_scores.len(),
            winner = winner.as_ref().map(|w| w.name.as_str()).unwrap_or("-"),
            "game ended"
        );

        let summary = finished.map(|game| Self::summarize(&game, &standings, ended_at));

        let mut notifications = vec![Notification::new(
            Audience::All,
            ServerMessage::GameEnded(FinalStandings {
                final_scores,
                winner,
            }),
        )];
        notifications.extend(self.state_notifications());
        GameEnded {
            notifications,
            summary,
        }
    }

    fn summarize(
        game: &ActiveGame,
        standings: &[Player],
        ended_at: OffsetDateTime,
    ) -> SessionSummaryEntity {
        let winner = standings.first();
        SessionSummaryEntity {
            id: Uuid::new_v4(),
            started_at: format_timestamp(game.started_at),
            ended_at: format_timestamp(ended_at),
            quiz_id: game.quiz().and_then(|context| context.quiz_id),
            total_players: standings.len(),
            total_questions: game.rounds_closed,
            winner_name: winner.map(|player| player.display_name.clone()),
            winner_score: winner.map(|player| player.score),
            players: standings
                .iter()
                .map(|player| PlayerResultEntity {
                    player_name: player.display_name.clone(),
                    final_score: player.score,
                    questions_answered: player.questions_answered,
                    correct_answers: player.correct_answers,
                })
                .collect(),
        }
    }

    /// Record a player's answer for the open round. The first answer is final.
    pub fn submit_answer(
        &mut self,
        connection_id: ConnectionId,
        choice: Choice,
        submitted_at: Instant,
    ) -> Result<Notifications, GameError> {
        let player_name = self
            .registry
            .get(&connection_id)
            .map(|player| player.display_name.clone())
            .ok_or(GameError::PlayerNotFound)?;
        let round = self
            .active_mut()
            .and_then(|game| game.round.as_mut())
            .ok_or(GameError::NoOpenRound)?;
        if round.submissions.contains_key(&connection_id) {
            return Err(GameError::AlreadyAnswered);
        }

        let question_id = round.question.id;
        let response_time_ms = scoring::response_time_ms(round.started_at, submitted_at);
        round.submissions.insert(
            connection_id,
            AnswerSubmission {
                player_id: connection_id,
                player_name: player_name.clone(),
                question_id,
                choice,
                submitted_at,
            },
        );
        debug!(player = %player_name, %choice, response_time_ms, "answer recorded");

        Ok(vec![
            Notification::new(
                Audience::Connection(connection_id),
                ServerMessage::AnswerSubmitted(AnswerReceipt {
                    question_id,
                    choice,
                }),
            ),
            Notification::new(
                Audience::Admins,
                ServerMessage::PlayerAnswered(PlayerAnswered {
                    player_id: connection_id,
                    player_name,
                    choice,
                    response_time_ms,
                }),
            ),
        ])
    }

    /// Replayable view of the session, shaped for `view`.
    pub fn snapshot(&self, view: SnapshotView) -> GameStateSnapshot {
        let players = self.player_summaries();
        let Some(game) = self.active() else {
            return GameStateSnapshot {
                is_active: false,
                phase: PhaseKind::Idle,
                current_question: None,
                seconds_remaining: 0,
                players,
                quiz: None,
            };
        };

        let quiz = game.quiz().map(|context| QuizProgress {
            quiz_id: context.quiz_id,
            name: context.name.clone(),
            next_index: context.next_index,
            total_questions: context.total(),
        });
        let (phase, current_question, seconds_remaining) = match &game.round {
            Some(round) => {
                let question = match view {
                    SnapshotView::Full => QuestionView::Full(QuestionDto::from(&round.question)),
                    SnapshotView::PlayerSafe => QuestionView::PlayerSafe(PlayerQuestion::project(
                        &round.question,
                        round.time_limit_secs,
                        round.position,
                    )),
                };
                (
                    PhaseKind::QuestionLive,
                    Some(question),
                    round.seconds_remaining,
                )
            }
            None => (PhaseKind::Active, None, 0),
        };

        GameStateSnapshot {
            is_active: true,
            phase,
            current_question,
            seconds_remaining,
            players,
            quiz,
        }
    }

    /// `game_state` for both connection classes: full to admins, player-safe to everyone else.
    pub fn state_notifications(&self) -> Notifications {
        vec![
            Notification::new(
                Audience::Admins,
                ServerMessage::GameState(self.snapshot(SnapshotView::Full)),
            ),
            Notification::new(
                Audience::Players,
                ServerMessage::GameState(self.snapshot(SnapshotView::PlayerSafe)),
            ),
        ]
    }

    fn player_summaries(&self) -> Vec<PlayerSummary> {
        self.registry.snapshot().iter().map(Into::into).collect()
    }

    fn players_updated(&self) -> Notification {
        Notification::new(
            Audience::All,
            ServerMessage::PlayersUpdated(self.player_summaries()),
        )
    }

    fn scores_updated(&self) -> Notification {
        Notification::new(
            Audience::All,
            ServerMessage::ScoresUpdated(self.player_summaries()),
        )
    }

    fn active(&self) -> Option<&ActiveGame> {
        match &self.phase {
            GamePhase::Active(game) => Some(game),
            GamePhase::Idle => None,
        }
    }

    fn active_mut(&mut self) -> Option<&mut ActiveGame> {
        match &mut self.phase {
            GamePhase::Active(game) => Some(game),
            GamePhase::Idle => None,
        }
    }

    fn round_mut(&mut self, round_id: RoundId) -> Option<&mut Round> {
        self.active_mut()
            .and_then(|game| game.round.as_mut())
            .filter(|round| round.id == round_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::game::AnswerOptions;

    fn question(id: u64, correct: Choice, limit: Option<i64>) -> Question {
        Question {
            id,
            prompt: format!("Question {id}"),
            options: AnswerOptions {
                a: "a".into(),
                b: "b".into(),
                c: "c".into(),
                d: "d".into(),
            },
            correct_answer: correct,
            time_limit_seconds: limit,
            media: None,
            category: None,
            difficulty: None,
        }
    }

    fn quiz(len: u64) -> Quiz {
        Quiz {
            id: Some(7),
            name: "Planets".into(),
            questions: (1..=len).map(|id| question(id, Choice::A, None)).collect(),
        }
    }

    fn events(notifications: &[Notification]) -> Vec<&'static str> {
        notifications
            .iter()
            .map(|notification| notification.message.event_name())
            .collect()
    }

    fn results(notifications: &[Notification]) -> &crate::dto::game::QuestionResults {
        notifications
            .iter()
            .find_map(|notification| match &notification.message {
                ServerMessage::QuestionResults(results) => Some(results),
                _ => None,
            })
            .expect("question_results notification")
    }

    fn score_of(session: &GameSession, id: &ConnectionId) -> u32 {
        session.registry().get(id).unwrap().score
    }

    #[test]
    fn second_join_with_same_name_is_rejected() {
        let mut session = GameSession::new(30);
        let first = session.join(Uuid::new_v4(), "Alice".into()).unwrap();
        assert_eq!(
            events(&first),
            vec!["join_success", "players_updated", "game_state"]
        );

        let err = session.join(Uuid::new_v4(), "Alice".into()).unwrap_err();
        assert_eq!(err, GameError::NameTaken("Alice".into()));
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn start_game_twice_fails_with_already_active() {
        let mut session = GameSession::new(30);
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        assert_eq!(
            session.start_game(OffsetDateTime::now_utc()).unwrap_err(),
            GameError::AlreadyActive
        );
        assert_eq!(
            session.start_quiz(quiz(1), OffsetDateTime::now_utc()).unwrap_err(),
            GameError::AlreadyActive
        );
    }

    #[test]
    fn show_question_requires_active_game_and_no_open_round() {
        let mut session = GameSession::new(30);
        let now = Instant::now();
        assert_eq!(
            session.show_question(question(1, Choice::A, None), now).unwrap_err(),
            GameError::GameNotActive
        );

        session.start_game(OffsetDateTime::now_utc()).unwrap();
        let opened = session.show_question(question(1, Choice::A, None), now).unwrap();
        assert_eq!(opened.time_limit_secs, 30);
        assert_eq!(
            session.show_question(question(2, Choice::A, None), now).unwrap_err(),
            GameError::RoundAlreadyOpen
        );
    }

    #[test]
    fn correct_fast_answer_scores_full_points() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        session.join(alice, "Alice".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();

        let start = Instant::now();
        session
            .show_question(question(1, Choice::C, Some(30)), start)
            .unwrap();
        session
            .submit_answer(alice, Choice::C, start + Duration::from_millis(500))
            .unwrap();
        let closed = session.end_question().unwrap();

        let results = results(&closed);
        assert!(results.answers[0].is_correct);
        assert_eq!(results.answers[0].points_earned, 1000);
        assert_eq!(score_of(&session, &alice), 1000);
        assert_eq!(
            events(&closed),
            vec!["question_results", "scores_updated", "game_state", "game_state"]
        );
    }

    #[test]
    fn expiry_closes_once_and_later_end_question_fails() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        session.join(alice, "Alice".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();

        let start = Instant::now();
        let opened = session
            .show_question(question(1, Choice::C, Some(30)), start)
            .unwrap();
        session
            .submit_answer(alice, Choice::C, start + Duration::from_millis(500))
            .unwrap();

        let closed = session.expire_round(opened.round_id);
        assert_eq!(results(&closed).answers[0].points_earned, 1000);
        assert!(session.expire_round(opened.round_id).is_empty());
        assert_eq!(session.end_question().unwrap_err(), GameError::NoOpenRound);
        assert_eq!(score_of(&session, &alice), 1000);
    }

    #[test]
    fn stale_ticks_and_expiry_do_not_touch_the_next_round() {
        let mut session = GameSession::new(30);
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        let first = session
            .show_question(question(1, Choice::A, None), Instant::now())
            .unwrap();
        session.end_question().unwrap();
        let second = session
            .show_question(question(2, Choice::A, None), Instant::now())
            .unwrap();

        assert!(session.tick(first.round_id, 3).is_empty());
        assert!(session.expire_round(first.round_id).is_empty());
        assert_eq!(session.open_round_id(), Some(second.round_id));

        assert_eq!(events(&session.tick(second.round_id, 29)), vec!["timer_update"]);
        assert_eq!(
            session.snapshot(SnapshotView::PlayerSafe).seconds_remaining,
            29
        );
    }

    #[test]
    fn quiz_advances_by_request_and_reports_completion() {
        let mut session = GameSession::new(30);
        session.start_quiz(quiz(3), OffsetDateTime::now_utc()).unwrap();

        for number in 1..=3 {
            let opened = session.show_next_quiz_question(Instant::now()).unwrap();
            match &opened.notifications[0].message {
                ServerMessage::QuestionShown(shown) => {
                    assert_eq!(shown.question_number, Some(number));
                    assert_eq!(shown.total_questions, Some(3));
                }
                other => panic!("unexpected message {other:?}"),
            }
            assert_eq!(
                session.show_next_quiz_question(Instant::now()).unwrap_err(),
                GameError::RoundAlreadyOpen
            );

            let closed = session.end_question().unwrap();
            assert_eq!(events(&closed).contains(&"quiz_completed"), number == 3);
        }

        assert_eq!(
            session.show_next_quiz_question(Instant::now()).unwrap_err(),
            GameError::QuizExhausted
        );
        assert!(session.is_active());
    }

    #[test]
    fn next_quiz_question_without_quiz_fails() {
        let mut session = GameSession::new(30);
        assert_eq!(
            session.show_next_quiz_question(Instant::now()).unwrap_err(),
            GameError::NoActiveQuiz
        );
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        assert_eq!(
            session.show_next_quiz_question(Instant::now()).unwrap_err(),
            GameError::NoActiveQuiz
        );
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let mut session = GameSession::new(30);
        assert_eq!(
            session.start_quiz(quiz(0), OffsetDateTime::now_utc()).unwrap_err(),
            GameError::QuizEmpty
        );
        assert!(!session.is_active());
    }

    #[test]
    fn only_correct_player_gains_points() {
        let mut session = GameSession::new(30);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        session.join(alice, "Alice".into()).unwrap();
        session.join(bob, "Bob".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();

        let start = Instant::now();
        session
            .show_question(question(1, Choice::B, None), start)
            .unwrap();
        session
            .submit_answer(alice, Choice::B, start + Duration::from_millis(200))
            .unwrap();
        session
            .submit_answer(bob, Choice::D, start + Duration::from_millis(300))
            .unwrap();
        let closed = session.end_question().unwrap();

        let results = results(&closed);
        assert_eq!(results.correct_count, 1);
        assert_eq!(results.total_answered, 2);
        assert_eq!(score_of(&session, &alice), 1000);
        assert_eq!(score_of(&session, &bob), 0);
        let bob_stats = session.registry().get(&bob).unwrap();
        assert_eq!((bob_stats.questions_answered, bob_stats.correct_answers), (1, 0));
    }

    #[test]
    fn resubmission_is_rejected() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        session.join(alice, "Alice".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        session
            .show_question(question(1, Choice::A, None), Instant::now())
            .unwrap();

        session.submit_answer(alice, Choice::B, Instant::now()).unwrap();
        assert_eq!(
            session
                .submit_answer(alice, Choice::A, Instant::now())
                .unwrap_err(),
            GameError::AlreadyAnswered
        );
        let closed = session.end_question().unwrap();
        assert_eq!(results(&closed).answers[0].choice, Choice::B);
    }

    #[test]
    fn submit_answer_checks_player_and_round() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        assert_eq!(
            session
                .submit_answer(alice, Choice::A, Instant::now())
                .unwrap_err(),
            GameError::PlayerNotFound
        );
        session.join(alice, "Alice".into()).unwrap();
        assert_eq!(
            session
                .submit_answer(alice, Choice::A, Instant::now())
                .unwrap_err(),
            GameError::NoOpenRound
        );
    }

    #[test]
    fn answer_feedback_goes_to_submitter_and_admins() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        session.join(alice, "Alice".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        session
            .show_question(question(1, Choice::A, None), Instant::now())
            .unwrap();

        let sent = session.submit_answer(alice, Choice::A, Instant::now()).unwrap();
        assert_eq!(sent[0].audience, Audience::Connection(alice));
        assert_eq!(sent[1].audience, Audience::Admins);
    }

    #[test]
    fn departed_player_stays_in_results_without_points() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        session.join(alice, "Alice".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        let start = Instant::now();
        session
            .show_question(question(1, Choice::A, None), start)
            .unwrap();
        session.submit_answer(alice, Choice::A, start).unwrap();
        session.leave(&alice);

        let closed = session.end_question().unwrap();
        let results = results(&closed);
        assert_eq!(results.total_answered, 1);
        assert_eq!(results.answers[0].player_name, "Alice");
        assert_eq!(results.answers[0].points_earned, 0);
    }

    #[test]
    fn player_snapshot_hides_correct_answer() {
        let mut session = GameSession::new(30);
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        let opened = session
            .show_question(question(1, Choice::D, None), Instant::now())
            .unwrap();

        for notification in &opened.notifications {
            let value = serde_json::to_value(&notification.message).unwrap();
            let leaks = value.to_string().contains("correct_answer");
            assert_eq!(leaks, notification.audience == Audience::Admins);
        }
        let safe = serde_json::to_value(session.snapshot(SnapshotView::PlayerSafe)).unwrap();
        assert!(safe["current_question"].get("correct_answer").is_none());
        let full = serde_json::to_value(session.snapshot(SnapshotView::Full)).unwrap();
        assert_eq!(full["current_question"]["correct_answer"], "D");
    }

    #[test]
    fn end_game_ranks_players_and_builds_summary() {
        let mut session = GameSession::new(30);
        let (ann, ben) = (Uuid::new_v4(), Uuid::new_v4());
        session.join(ann, "Ann".into()).unwrap();
        session.join(ben, "Ben".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        let start = Instant::now();
        session
            .show_question(question(1, Choice::A, None), start)
            .unwrap();
        session.submit_answer(ben, Choice::A, start).unwrap();
        session.end_question().unwrap();

        let ended = session.end_game(OffsetDateTime::now_utc());
        assert!(!session.is_active());
        match &ended.notifications[0].message {
            ServerMessage::GameEnded(standings) => {
                assert_eq!(standings.final_scores[0].name, "Ben");
                assert_eq!(standings.winner.as_ref().unwrap().score, 1000);
            }
            other => panic!("unexpected message {other:?}"),
        }
        let summary = ended.summary.unwrap();
        assert_eq!(summary.total_players, 2);
        assert_eq!(summary.total_questions, 1);
        assert_eq!(summary.winner_name.as_deref(), Some("Ben"));
        assert_eq!(summary.players[0].correct_answers, 1);
    }

    #[test]
    fn end_game_while_idle_has_no_summary() {
        let mut session = GameSession::new(30);
        let ended = session.end_game(OffsetDateTime::now_utc());
        assert!(ended.summary.is_none());
        match &ended.notifications[0].message {
            ServerMessage::GameEnded(standings) => assert!(standings.winner.is_none()),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn new_game_resets_scores() {
        let mut session = GameSession::new(30);
        let alice = Uuid::new_v4();
        session.join(alice, "Alice".into()).unwrap();
        session.start_game(OffsetDateTime::now_utc()).unwrap();
        let start = Instant::now();
        session
            .show_question(question(1, Choice::A, None), start)
            .unwrap();
        session.submit_answer(alice, Choice::A, start).unwrap();
        session.end_question().unwrap();
        session.end_game(OffsetDateTime::now_utc());

        session.start_game(OffsetDateTime::now_utc()).unwrap();
        assert_eq!(score_of(&session, &alice), 0);
    }
}
