//! Answer grading: turns the submissions of one question into verdicts,
//! points, and participant score increments.

use std::collections::HashSet;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    dao::{
        models::{QuestionEntity, QuizEntity},
        quiz_store::QuizStore,
    },
    error::ServiceError,
    services::{scoring, sse_events},
    state::SharedState,
};

/// Result of grading one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeOutcome {
    /// Number of submissions graded by this invocation. Already-graded
    /// submissions are skipped, so re-grading a question reports zero.
    pub graded_count: usize,
}

/// Grade every ungraded submission for `question`.
///
/// Each submission is checked against the answer key, scored with the speed
/// bonus relative to `question_started_at`, and marked graded in the store.
/// The grading mark is write-once, which makes the whole operation
/// idempotent: a retried grading pass finds nothing left to grade and never
/// double-counts participant scores.
///
/// A failure on one submission is logged and does not block grading the
/// rest; committed scores are never rolled back.
pub async fn grade_question(
    state: &SharedState,
    quiz: &QuizEntity,
    question: &QuestionEntity,
    question_started_at: OffsetDateTime,
) -> Result<GradeOutcome, ServiceError> {
    if question
        .correct_answers
        .iter()
        .all(|answer| answer.trim().is_empty())
    {
        return Err(ServiceError::MissingAnswerKey(question.id));
    }

    let store = state.require_store().await?;
    let submissions = store
        .list_answers_for_question(quiz.id, question.id)
        .await?;

    let mut graded_count = 0;
    let mut scored_users: HashSet<String> = HashSet::new();

    for submission in submissions.iter().filter(|answer| !answer.is_graded()) {
        // Clamp clock skew so a submission stamped before the question opened
        // still grades as an in-window answer at elapsed zero.
        let elapsed_secs = (submission.submitted_at - question_started_at)
            .whole_seconds()
            .max(0);
        let is_correct =
            scoring::check_answer(question.kind, &submission.values, &question.correct_answers);
        let points = if is_correct {
            scoring::score(quiz.base_points, quiz.time_limit_secs, elapsed_secs)
        } else {
            0
        };

        match store
            .mark_answer_graded(quiz.id, question.id, &submission.user_id, is_correct, points)
            .await
        {
            Ok(true) => {
                graded_count += 1;
                if is_correct && points > 0 {
                    match store
                        .increment_participant_score(quiz.id, &submission.user_id, points)
                        .await
                    {
                        Ok(_new_total) => {
                            scored_users.insert(submission.user_id.clone());
                        }
                        Err(err) => warn!(
                            quiz_id = %quiz.id,
                            question_id = %question.id,
                            user_id = %submission.user_id,
                            error = %err,
                            "failed to apply score increment"
                        ),
                    }
                }
            }
            // Another grading pass got there first; its verdict stands.
            Ok(false) => {}
            Err(err) => warn!(
                quiz_id = %quiz.id,
                question_id = %question.id,
                user_id = %submission.user_id,
                error = %err,
                "failed to grade submission"
            ),
        }
    }

    if !scored_users.is_empty() {
        broadcast_new_scores(state, quiz, &scored_users).await;
    }

    debug!(
        quiz_id = %quiz.id,
        question_id = %question.id,
        graded_count,
        "graded question submissions"
    );

    Ok(GradeOutcome { graded_count })
}

/// Push `score.updated` events for every participant whose total changed.
async fn broadcast_new_scores(state: &SharedState, quiz: &QuizEntity, users: &HashSet<String>) {
    let Ok(store) = state.require_store().await else {
        return;
    };
    match store.list_participants(quiz.id).await {
        Ok(roster) => {
            for participant in roster
                .into_iter()
                .filter(|entry| users.contains(&entry.user_id))
            {
                sse_events::broadcast_score_updated(state, quiz.id, participant.into());
            }
        }
        Err(err) => warn!(
            quiz_id = %quiz.id,
            error = %err,
            "failed to load roster for score broadcast"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{AnswerEntity, ParticipantEntity, QuestionKind},
            quiz_store::{QuizStore, memory::MemoryStore},
        },
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    fn quiz() -> QuizEntity {
        QuizEntity {
            id: Uuid::new_v4(),
            organizer_id: "org-1".into(),
            title: "Capitals".into(),
            description: None,
            category: None,
            room_code: "ABC234".into(),
            status: crate::dao::models::QuizStatus::Active,
            time_limit_secs: 30,
            base_points: 10,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn question(quiz_id: Uuid, kind: QuestionKind, correct: &[&str]) -> QuestionEntity {
        QuestionEntity {
            id: Uuid::new_v4(),
            quiz_id,
            text: "What is the capital of France?".into(),
            image_url: None,
            kind,
            options: match kind {
                QuestionKind::Text => Vec::new(),
                _ => vec!["A".into(), "B".into(), "C".into()],
            },
            correct_answers: correct.iter().map(|v| v.to_string()).collect(),
            position: 0,
        }
    }

    async fn join(store: &dyn QuizStore, quiz_id: Uuid, user: &str) {
        store
            .upsert_participant(ParticipantEntity {
                quiz_id,
                user_id: user.into(),
                display_name: user.to_uppercase(),
                score: 0,
                joined_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();
    }

    async fn submit(
        store: &dyn QuizStore,
        quiz_id: Uuid,
        question_id: Uuid,
        user: &str,
        values: &[&str],
        submitted_at: OffsetDateTime,
    ) {
        store
            .insert_answer(AnswerEntity {
                id: Uuid::new_v4(),
                quiz_id,
                question_id,
                user_id: user.into(),
                values: values.iter().map(|v| v.to_string()).collect(),
                is_correct: None,
                points_earned: None,
                submitted_at,
            })
            .await
            .unwrap();
    }

    async fn score_of(store: &dyn QuizStore, quiz_id: Uuid, user: &str) -> u32 {
        store
            .list_participants(quiz_id)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.user_id == user)
            .unwrap()
            .score
    }

    #[tokio::test]
    async fn grades_correct_and_incorrect_submissions() {
        let state = test_state().await;
        let store = state.require_store().await.unwrap();
        let quiz = quiz();
        let question = question(quiz.id, QuestionKind::SingleChoice, &["B"]);
        let started = OffsetDateTime::now_utc();

        join(store.as_ref(), quiz.id, "fast").await;
        join(store.as_ref(), quiz.id, "wrong").await;
        submit(store.as_ref(), quiz.id, question.id, "fast", &["B"], started + Duration::seconds(10)).await;
        submit(store.as_ref(), quiz.id, question.id, "wrong", &["A"], started + Duration::seconds(5)).await;

        let outcome = grade_question(&state, &quiz, &question, started).await.unwrap();
        assert_eq!(outcome.graded_count, 2);
        // round(10 + 10 * 20/30) = 17
        assert_eq!(score_of(store.as_ref(), quiz.id, "fast").await, 17);
        assert_eq!(score_of(store.as_ref(), quiz.id, "wrong").await, 0);

        let graded = store
            .list_answers_for_question(quiz.id, question.id)
            .await
            .unwrap();
        assert!(graded.iter().all(|answer| answer.is_graded()));
    }

    #[tokio::test]
    async fn regrading_is_a_no_op() {
        let state = test_state().await;
        let store = state.require_store().await.unwrap();
        let quiz = quiz();
        let question = question(quiz.id, QuestionKind::SingleChoice, &["B"]);
        let started = OffsetDateTime::now_utc();

        join(store.as_ref(), quiz.id, "u1").await;
        submit(store.as_ref(), quiz.id, question.id, "u1", &["B"], started + Duration::seconds(15)).await;

        let first = grade_question(&state, &quiz, &question, started).await.unwrap();
        assert_eq!(first.graded_count, 1);
        let total = score_of(store.as_ref(), quiz.id, "u1").await;

        let second = grade_question(&state, &quiz, &question, started).await.unwrap();
        assert_eq!(second.graded_count, 0);
        assert_eq!(score_of(store.as_ref(), quiz.id, "u1").await, total);
    }

    #[tokio::test]
    async fn multiple_choice_set_semantics() {
        let state = test_state().await;
        let store = state.require_store().await.unwrap();
        let quiz = quiz();
        let question = question(quiz.id, QuestionKind::MultipleChoice, &["A", "C"]);
        let started = OffsetDateTime::now_utc();

        join(store.as_ref(), quiz.id, "swapped").await;
        join(store.as_ref(), quiz.id, "partial").await;
        join(store.as_ref(), quiz.id, "superset").await;
        submit(store.as_ref(), quiz.id, question.id, "swapped", &["C", "A"], started + Duration::seconds(30)).await;
        submit(store.as_ref(), quiz.id, question.id, "partial", &["A"], started + Duration::seconds(30)).await;
        submit(store.as_ref(), quiz.id, question.id, "superset", &["A", "B", "C"], started + Duration::seconds(30)).await;

        grade_question(&state, &quiz, &question, started).await.unwrap();

        assert_eq!(score_of(store.as_ref(), quiz.id, "swapped").await, 10);
        assert_eq!(score_of(store.as_ref(), quiz.id, "partial").await, 0);
        assert_eq!(score_of(store.as_ref(), quiz.id, "superset").await, 0);
    }

    #[tokio::test]
    async fn negative_elapsed_is_clamped() {
        let state = test_state().await;
        let store = state.require_store().await.unwrap();
        let quiz = quiz();
        let question = question(quiz.id, QuestionKind::SingleChoice, &["B"]);
        let started = OffsetDateTime::now_utc();

        join(store.as_ref(), quiz.id, "skewed").await;
        // Clock skew: submission stamped before the question opened.
        submit(store.as_ref(), quiz.id, question.id, "skewed", &["B"], started - Duration::seconds(3)).await;

        grade_question(&state, &quiz, &question, started).await.unwrap();
        assert_eq!(score_of(store.as_ref(), quiz.id, "skewed").await, 10);
    }

    #[tokio::test]
    async fn missing_answer_key_is_a_configuration_error() {
        let state = test_state().await;
        let quiz = quiz();
        let mut question = question(quiz.id, QuestionKind::Text, &["Paris"]);
        question.correct_answers = vec!["   ".into()];

        let err = grade_question(&state, &quiz, &question, OffsetDateTime::now_utc())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingAnswerKey(id) if id == question.id));
    }
}
