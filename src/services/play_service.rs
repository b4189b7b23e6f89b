//! Participant-facing operations: joining a session, submitting answers, and
//! the read-only views used by play clients and as the SSE reconciliation
//! fallback.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::{
        models::{AnswerEntity, QuestionEntity, QuizStatus, RuntimeStateEntity},
        quiz_store::QuizStore,
    },
    dto::{
        common::SessionSnapshot,
        format_timestamp,
        play::{AnswerReceipt, JoinRequest, JoinResponse, LeaderboardEntry, LeaderboardResponse, SubmitAnswerRequest},
    },
    error::ServiceError,
    services::{room_service, sse_events},
    state::SharedState,
};

/// Join a session by room code; repeated joins are no-ops returning the same
/// session id.
pub async fn join(
    state: &SharedState,
    user_id: &str,
    request: JoinRequest,
) -> Result<JoinResponse, ServiceError> {
    if request.display_name.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "display name must not be empty".into(),
        ));
    }

    let (quiz, participant, newly_joined) =
        room_service::resolve_join(state, &request.code, user_id, &request.display_name).await?;

    if newly_joined {
        sse_events::broadcast_participant_joined(state, quiz.id, participant.clone().into());
    }

    Ok(JoinResponse {
        quiz_id: quiz.id,
        participant: participant.into(),
    })
}

/// Build the full authoritative snapshot of one session.
///
/// Carries everything a viewer needs to re-render: status, sanitized current
/// question, and the roster with scores. Served on its own endpoint so
/// clients that missed SSE events can reconcile by polling.
pub async fn session_snapshot(
    state: &SharedState,
    quiz_id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    let store = state.require_store().await?;
    let Some(quiz) = store.find_quiz(quiz_id).await? else {
        return Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")));
    };
    let runtime = store.find_runtime(quiz_id).await?;
    let questions = store.list_questions(quiz_id).await?;
    let participants = store.list_participants(quiz_id).await?;

    let question = runtime
        .as_ref()
        .filter(|_| matches!(quiz.status, QuizStatus::Active | QuizStatus::Paused))
        .and_then(|runtime| current_question(runtime, &questions))
        .cloned();

    Ok(SessionSnapshot {
        quiz_id: quiz.id,
        status: quiz.status,
        room_code: quiz.room_code,
        time_limit_secs: quiz.time_limit_secs,
        base_points: quiz.base_points,
        question_count: questions.len(),
        current_question_index: runtime.as_ref().map(|r| r.current_question_index),
        question_started_at: runtime
            .as_ref()
            .and_then(|r| r.question_started_at)
            .map(format_timestamp),
        started_at: runtime.as_ref().and_then(|r| r.started_at).map(format_timestamp),
        ended_at: runtime.as_ref().and_then(|r| r.ended_at).map(format_timestamp),
        question: question.map(Into::into),
        participants: participants.into_iter().map(Into::into).collect(),
    })
}

/// Store one answer for the session's current question. First submission
/// wins; the uniqueness constraint rejects everything after it.
pub async fn submit_answer(
    state: &SharedState,
    user_id: &str,
    quiz_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<AnswerReceipt, ServiceError> {
    if request.values.is_empty() || request.values.iter().any(|value| value.trim().is_empty()) {
        return Err(ServiceError::InvalidInput(
            "submitted values must not be blank".into(),
        ));
    }

    let store = state.require_store().await?;
    let Some(quiz) = store.find_quiz(quiz_id).await? else {
        return Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")));
    };
    if quiz.status != QuizStatus::Active {
        return Err(ServiceError::InvalidState(
            "answers are only accepted while the session is active".into(),
        ));
    }

    let runtime = store
        .find_runtime(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::InvalidState("session has not started".into()))?;
    if runtime.current_question_id != Some(request.question_id) {
        return Err(ServiceError::Conflict(
            "submission does not target the current question".into(),
        ));
    }

    let joined = store
        .list_participants(quiz_id)
        .await?
        .iter()
        .any(|participant| participant.user_id == user_id);
    if !joined {
        return Err(ServiceError::Forbidden(
            "join the session before answering".into(),
        ));
    }

    let answer = AnswerEntity {
        id: Uuid::new_v4(),
        quiz_id,
        question_id: request.question_id,
        user_id: user_id.to_string(),
        values: request.values,
        is_correct: None,
        points_earned: None,
        submitted_at: OffsetDateTime::now_utc(),
    };

    if !store.insert_answer(answer.clone()).await? {
        return Err(ServiceError::AnswerAlreadySubmitted);
    }

    Ok(AnswerReceipt {
        answer_id: answer.id,
        question_id: answer.question_id,
        submitted_at: format_timestamp(answer.submitted_at),
    })
}

/// Leaderboard ordered by score descending; earlier joiners win ties.
pub async fn leaderboard(
    state: &SharedState,
    quiz_id: Uuid,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_store().await?;
    if store.find_quiz(quiz_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")));
    }

    let mut roster = store.list_participants(quiz_id).await?;
    roster.sort_by(|a, b| b.score.cmp(&a.score).then(a.joined_at.cmp(&b.joined_at)));

    let entries = roster
        .into_iter()
        .enumerate()
        .map(|(index, participant)| LeaderboardEntry {
            rank: index + 1,
            user_id: participant.user_id,
            display_name: participant.display_name,
            score: participant.score,
        })
        .collect();

    Ok(LeaderboardResponse { quiz_id, entries })
}

/// Resolve the current question, preferring the stable id reference over the
/// index so question reordering can never misdirect a lookup.
pub(crate) fn current_question<'a>(
    runtime: &RuntimeStateEntity,
    questions: &'a [QuestionEntity],
) -> Option<&'a QuestionEntity> {
    runtime
        .current_question_id
        .and_then(|id| questions.iter().find(|question| question.id == id))
        .or_else(|| questions.get(runtime.current_question_index))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::QuestionKind, quiz_store::memory::MemoryStore},
        dto::quiz::{CreateQuizRequest, QuestionInput},
        services::quiz_service,
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    /// Author a one-question quiz and force it into the active state.
    async fn active_session(state: &SharedState) -> (Uuid, Uuid, String) {
        let summary = quiz_service::create_quiz(
            state,
            "org-1",
            CreateQuizRequest {
                title: "Capitals".into(),
                description: None,
                category: None,
                time_limit_secs: 30,
                base_points: 10,
            },
        )
        .await
        .unwrap();
        let question = quiz_service::add_question(
            state,
            "org-1",
            summary.id,
            QuestionInput {
                text: "Pick one".into(),
                image_url: None,
                kind: QuestionKind::SingleChoice,
                options: vec!["A".into(), "B".into()],
                correct_answers: vec!["B".into()],
            },
        )
        .await
        .unwrap();

        let store = state.require_store().await.unwrap();
        let mut quiz = store.find_quiz(summary.id).await.unwrap().unwrap();
        quiz.status = QuizStatus::Active;
        store.update_quiz(quiz).await.unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .upsert_runtime(RuntimeStateEntity {
                quiz_id: summary.id,
                status: QuizStatus::Active,
                current_question_index: 0,
                current_question_id: Some(question.id),
                question_started_at: Some(now),
                started_at: Some(now),
                ended_at: None,
            })
            .await
            .unwrap();

        (summary.id, question.id, summary.room_code)
    }

    #[tokio::test]
    async fn first_submission_wins_and_duplicates_are_rejected() {
        let state = test_state().await;
        let (quiz_id, question_id, code) = active_session(&state).await;
        join(&state, "u1", JoinRequest { code, display_name: "Alice".into() })
            .await
            .unwrap();

        let receipt = submit_answer(
            &state,
            "u1",
            quiz_id,
            SubmitAnswerRequest { question_id, values: vec!["B".into()] },
        )
        .await
        .unwrap();
        assert_eq!(receipt.question_id, question_id);

        let err = submit_answer(
            &state,
            "u1",
            quiz_id,
            SubmitAnswerRequest { question_id, values: vec!["A".into()] },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::AnswerAlreadySubmitted));

        // The first submission stands unmodified.
        let store = state.require_store().await.unwrap();
        let stored = store
            .list_answers_for_question(quiz_id, question_id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].values, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn submissions_require_joining_first() {
        let state = test_state().await;
        let (quiz_id, question_id, _code) = active_session(&state).await;

        let err = submit_answer(
            &state,
            "stranger",
            quiz_id,
            SubmitAnswerRequest { question_id, values: vec!["B".into()] },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn submissions_must_target_the_current_question() {
        let state = test_state().await;
        let (quiz_id, _question_id, code) = active_session(&state).await;
        join(&state, "u1", JoinRequest { code, display_name: "Alice".into() })
            .await
            .unwrap();

        let err = submit_answer(
            &state,
            "u1",
            quiz_id,
            SubmitAnswerRequest { question_id: Uuid::new_v4(), values: vec!["B".into()] },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn paused_sessions_reject_submissions() {
        let state = test_state().await;
        let (quiz_id, question_id, code) = active_session(&state).await;
        join(&state, "u1", JoinRequest { code, display_name: "Alice".into() })
            .await
            .unwrap();

        let store = state.require_store().await.unwrap();
        let mut quiz = store.find_quiz(quiz_id).await.unwrap().unwrap();
        quiz.status = QuizStatus::Paused;
        store.update_quiz(quiz).await.unwrap();

        let err = submit_answer(
            &state,
            "u1",
            quiz_id,
            SubmitAnswerRequest { question_id, values: vec!["B".into()] },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn snapshot_exposes_the_question_without_its_answer_key() {
        let state = test_state().await;
        let (quiz_id, question_id, code) = active_session(&state).await;
        join(&state, "u1", JoinRequest { code, display_name: "Alice".into() })
            .await
            .unwrap();

        let snapshot = session_snapshot(&state, quiz_id).await.unwrap();
        assert_eq!(snapshot.status, QuizStatus::Active);
        assert_eq!(snapshot.current_question_index, Some(0));
        let question = snapshot.question.expect("active session exposes a question");
        assert_eq!(question.id, question_id);
        assert_eq!(question.options, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(snapshot.participants.len(), 1);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_score_then_join_time() {
        let state = test_state().await;
        let (quiz_id, _question_id, _code) = active_session(&state).await;
        let store = state.require_store().await.unwrap();

        let base = OffsetDateTime::now_utc();
        for (user, score, offset) in [("u1", 10, 0), ("u2", 25, 1), ("u3", 10, 2)] {
            store
                .upsert_participant(crate::dao::models::ParticipantEntity {
                    quiz_id,
                    user_id: user.into(),
                    display_name: user.to_uppercase(),
                    score,
                    joined_at: base + Duration::seconds(offset),
                })
                .await
                .unwrap();
        }

        let board = leaderboard(&state, quiz_id).await.unwrap();
        let order: Vec<&str> = board.entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["u2", "u1", "u3"]);
        assert_eq!(board.entries[0].rank, 1);
    }
}
