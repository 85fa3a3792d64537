//! Latency-decayed scoring of a closed round.
//!
//! Correct answers given within the first second earn the full 1000 points;
//! later correct answers decay linearly down to a floor of 250 points at the
//! end of the countdown. Wrong answers earn nothing.

use std::time::Instant;

use crate::state::game::{AnswerSubmission, Choice, ConnectionId, QuestionId};

/// Points for an instant correct answer.
pub const MAX_POINTS: u32 = 1000;
/// Points for a correct answer given at (or after) the end of the countdown.
pub const MIN_POINTS: u32 = MAX_POINTS / 4;
/// Answers at or under this latency earn [`MAX_POINTS`].
pub const INSTANT_RESPONSE_THRESHOLD_MS: u64 = 1000;

/// Scored outcome of a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOutcome {
    pub player_id: ConnectionId,
    pub player_name: String,
    pub choice: Choice,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub points_earned: u32,
}

/// Aggregated outcome of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub question_id: QuestionId,
    pub correct_answer: Choice,
    /// One entry per submission, in submission order.
    pub per_player: Vec<PlayerOutcome>,
    pub correct_count: usize,
    pub total_answered: usize,
}

/// Points earned by a correct answer given `response_time_ms` after the round opened.
pub fn points_for_correct(response_time_ms: u64, time_limit_secs: u32) -> u32 {
    if response_time_ms <= INSTANT_RESPONSE_THRESHOLD_MS {
        return MAX_POINTS;
    }

    let time_limit_ms = u64::from(time_limit_secs) * 1000;
    let window = time_limit_ms.saturating_sub(INSTANT_RESPONSE_THRESHOLD_MS);
    let ratio = if window == 0 {
        0.0
    } else {
        let remaining = time_limit_ms.saturating_sub(response_time_ms);
        (remaining as f64 / window as f64).clamp(0.0, 1.0)
    };

    let span = f64::from(MAX_POINTS - MIN_POINTS);
    let points = (f64::from(MIN_POINTS) + span * ratio).round() as u32;
    points.max(MIN_POINTS)
}

/// Score every submission of a round. Pure: applying the points is up to the caller.
pub fn score<'a, I>(
    question_id: QuestionId,
    submissions: I,
    correct_answer: Choice,
    round_start: Instant,
    time_limit_secs: u32,
) -> RoundResult
where
    I: IntoIterator<Item = &'a AnswerSubmission>,
{
    let per_player: Vec<PlayerOutcome> = submissions
        .into_iter()
        .map(|submission| {
            let is_correct = submission.choice == correct_answer;
            let response_time_ms = response_time_ms(round_start, submission.submitted_at);
            let points_earned = if is_correct {
                points_for_correct(response_time_ms, time_limit_secs)
            } else {
                0
            };
            PlayerOutcome {
                player_id: submission.player_id,
                player_name: submission.player_name.clone(),
                choice: submission.choice,
                is_correct,
                response_time_ms,
                points_earned,
            }
        })
        .collect();

    let correct_count = per_player.iter().filter(|outcome| outcome.is_correct).count();
    let total_answered = per_player.len();

    RoundResult {
        question_id,
        correct_answer,
        per_player,
        correct_count,
        total_answered,
    }
}

/// Milliseconds between the round opening and a submission, saturating at zero.
pub fn response_time_ms(round_start: Instant, submitted_at: Instant) -> u64 {
    let elapsed = submitted_at.saturating_duration_since(round_start);
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;

    fn submission(name: &str, choice: Choice, start: Instant, after_ms: u64) -> AnswerSubmission {
        AnswerSubmission {
            player_id: Uuid::new_v4(),
            player_name: name.into(),
            question_id: 1,
            choice,
            submitted_at: start + Duration::from_millis(after_ms),
        }
    }

    #[test]
    fn instant_answers_get_full_points() {
        assert_eq!(points_for_correct(0, 30), 1000);
        assert_eq!(points_for_correct(500, 30), 1000);
        assert_eq!(points_for_correct(1000, 30), 1000);
    }

    #[test]
    fn answer_at_deadline_gets_floor() {
        assert_eq!(points_for_correct(30_000, 30), 250);
    }

    #[test]
    fn late_answers_are_clamped_to_floor() {
        assert_eq!(points_for_correct(45_000, 30), 250);
    }

    #[test]
    fn points_decay_linearly_between_threshold_and_deadline() {
        // Halfway through the decay window of a 21 s round: 11 s elapsed, 10 s remaining.
        assert_eq!(points_for_correct(11_000, 21), 625);
        let early = points_for_correct(2_000, 30);
        let late = points_for_correct(20_000, 30);
        assert!(early > late);
        assert!(early < 1000 && late > 250);
    }

    #[test]
    fn one_second_limit_does_not_divide_by_zero() {
        assert_eq!(points_for_correct(1_500, 1), 250);
    }

    #[test]
    fn incorrect_answers_earn_nothing_regardless_of_timing() {
        let start = Instant::now();
        let subs = [submission("Bob", Choice::A, start, 0)];
        let result = score(1, &subs, Choice::C, start, 30);
        assert_eq!(result.per_player[0].points_earned, 0);
        assert!(!result.per_player[0].is_correct);
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.total_answered, 1);
    }

    #[test]
    fn mixed_round_counts_correct_and_total() {
        let start = Instant::now();
        let subs = [
            submission("Alice", Choice::C, start, 200),
            submission("Bob", Choice::B, start, 300),
        ];
        let result = score(42, &subs, Choice::C, start, 30);

        assert_eq!(result.question_id, 42);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.total_answered, 2);
        assert_eq!(result.per_player[0].player_name, "Alice");
        assert_eq!(result.per_player[0].points_earned, 1000);
        assert_eq!(result.per_player[0].response_time_ms, 200);
        assert_eq!(result.per_player[1].points_earned, 0);
    }

    #[test]
    fn submission_before_round_start_counts_as_instant() {
        let start = Instant::now() + Duration::from_secs(1);
        assert_eq!(response_time_ms(start, Instant::now()), 0);
    }
}
