//! Organizer-driven session lifecycle: start, pause, advance, and end.
//!
//! Every operation runs as one serialized state-machine transition (see
//! [`crate::state::AppState::run_session_transition`]): the side-effect work
//! grades and persists under the per-session gate, and the status change
//! commits only after that work succeeds. Grading always happens before the
//! question pointer moves, so scores are final before participants see the
//! next question.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::{
        models::{QuestionEntity, QuizEntity, QuizStatus, RuntimeStateEntity},
        quiz_store::QuizStore,
    },
    dto::host::TransitionResponse,
    error::ServiceError,
    services::{grading_service, play_service},
    state::{SessionEvent, SharedState, transitions},
};

/// Start a draft session, or resume a paused one.
///
/// Starting from `draft` requires at least one question and opens the first
/// question's answering window. Resuming restarts the current question's
/// window rather than preserving the original deadline.
pub async fn start(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let quiz = organizer_quiz(state, organizer_id, quiz_id).await?;
    let store = state.require_store().await?;
    let hydrate = quiz.status;

    let runtime = transitions::run_transition_with_broadcast(
        state,
        quiz_id,
        hydrate,
        SessionEvent::Start,
        |from| {
            let store = store.clone();
            let quiz = quiz.clone();
            async move {
                let questions = store.list_questions(quiz.id).await?;
                let now = OffsetDateTime::now_utc();

                let runtime = match from {
                    QuizStatus::Draft => {
                        if questions.is_empty() {
                            return Err(ServiceError::EmptyQuiz);
                        }
                        RuntimeStateEntity {
                            quiz_id: quiz.id,
                            status: QuizStatus::Active,
                            current_question_index: 0,
                            current_question_id: Some(questions[0].id),
                            question_started_at: Some(now),
                            started_at: Some(now),
                            ended_at: None,
                        }
                    }
                    QuizStatus::Paused => {
                        let mut runtime =
                            store.find_runtime(quiz.id).await?.ok_or_else(|| {
                                ServiceError::InvalidState(
                                    "paused session has no runtime record".into(),
                                )
                            })?;
                        runtime.status = QuizStatus::Active;
                        // Resume policy: the answering window restarts.
                        runtime.question_started_at = Some(now);
                        runtime
                    }
                    other => {
                        return Err(ServiceError::InvalidState(format!(
                            "cannot start from {other:?}"
                        )));
                    }
                };

                store.upsert_runtime(runtime.clone()).await?;
                let mut quiz = quiz;
                quiz.status = QuizStatus::Active;
                store.update_quiz(quiz).await?;
                Ok(runtime)
            }
        },
    )
    .await?;

    Ok(TransitionResponse {
        quiz_id,
        status: runtime.status,
        current_question_index: Some(runtime.current_question_index),
        graded_count: None,
    })
}

/// Pause an active session. Nothing is graded and the question pointer stays
/// where it is.
pub async fn pause(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let quiz = organizer_quiz(state, organizer_id, quiz_id).await?;
    let store = state.require_store().await?;
    let hydrate = quiz.status;

    let runtime = transitions::run_transition_with_broadcast(
        state,
        quiz_id,
        hydrate,
        SessionEvent::Pause,
        |_from| {
            let store = store.clone();
            let quiz = quiz.clone();
            async move {
                let mut runtime = store.find_runtime(quiz.id).await?.ok_or_else(|| {
                    ServiceError::InvalidState("session has not started".into())
                })?;
                runtime.status = QuizStatus::Paused;
                store.upsert_runtime(runtime.clone()).await?;

                let mut quiz = quiz;
                quiz.status = QuizStatus::Paused;
                store.update_quiz(quiz).await?;
                Ok(runtime)
            }
        },
    )
    .await?;

    Ok(TransitionResponse {
        quiz_id,
        status: runtime.status,
        current_question_index: Some(runtime.current_question_index),
        graded_count: None,
    })
}

/// Grade the current question and move to the next one; advancing past the
/// last question completes the session instead.
pub async fn advance(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let quiz = organizer_quiz(state, organizer_id, quiz_id).await?;
    let store = state.require_store().await?;

    let runtime = store
        .find_runtime(quiz_id)
        .await?
        .ok_or_else(|| ServiceError::InvalidState("session has not started".into()))?;
    let questions = store.list_questions(quiz_id).await?;

    if runtime.current_question_index + 1 >= questions.len() {
        return finish(state, quiz, questions).await;
    }

    let hydrate = quiz.status;
    let (runtime, graded_count) = transitions::run_transition_with_broadcast(
        state,
        quiz_id,
        hydrate,
        SessionEvent::Advance,
        |_from| {
            let state = state.clone();
            let store = store.clone();
            let quiz = quiz.clone();
            let questions = questions.clone();
            async move {
                let mut runtime = store.find_runtime(quiz.id).await?.ok_or_else(|| {
                    ServiceError::InvalidState("session has not started".into())
                })?;
                // Re-check under the gate: a concurrent advance may have
                // moved the pointer onto the last question meanwhile.
                if runtime.current_question_index + 1 >= questions.len() {
                    return Err(ServiceError::Conflict(
                        "session advanced concurrently; re-sync and retry".into(),
                    ));
                }

                let current = play_service::current_question(&runtime, &questions)
                    .ok_or_else(|| {
                        ServiceError::InvalidState("runtime points at a missing question".into())
                    })?;
                let started = runtime.question_started_at.ok_or_else(|| {
                    ServiceError::InvalidState("current question has no start timestamp".into())
                })?;
                let outcome =
                    grading_service::grade_question(&state, &quiz, current, started).await?;

                let next_index = runtime.current_question_index + 1;
                runtime.current_question_index = next_index;
                runtime.current_question_id = Some(questions[next_index].id);
                runtime.question_started_at = Some(OffsetDateTime::now_utc());
                store.upsert_runtime(runtime.clone()).await?;

                Ok((runtime, outcome.graded_count))
            }
        },
    )
    .await?;

    Ok(TransitionResponse {
        quiz_id,
        status: runtime.status,
        current_question_index: Some(runtime.current_question_index),
        graded_count: Some(graded_count),
    })
}

/// End an active or paused session, grading the current question first.
pub async fn end(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<TransitionResponse, ServiceError> {
    let quiz = organizer_quiz(state, organizer_id, quiz_id).await?;
    let store = state.require_store().await?;
    let questions = store.list_questions(quiz_id).await?;
    finish(state, quiz, questions).await
}

/// Shared completion path for `end` and for `advance` running past the last
/// question.
async fn finish(
    state: &SharedState,
    quiz: QuizEntity,
    questions: Vec<QuestionEntity>,
) -> Result<TransitionResponse, ServiceError> {
    let store = state.require_store().await?;
    let quiz_id = quiz.id;
    let hydrate = quiz.status;

    let (runtime, graded_count) = transitions::run_transition_with_broadcast(
        state,
        quiz_id,
        hydrate,
        SessionEvent::End,
        |_from| {
            let state = state.clone();
            let store = store.clone();
            let quiz = quiz.clone();
            let questions = questions.clone();
            async move {
                let mut runtime = store.find_runtime(quiz.id).await?.ok_or_else(|| {
                    ServiceError::InvalidState("session has not started".into())
                })?;

                let graded_count = match (
                    play_service::current_question(&runtime, &questions),
                    runtime.question_started_at,
                ) {
                    (Some(current), Some(started)) => {
                        grading_service::grade_question(&state, &quiz, current, started)
                            .await?
                            .graded_count
                    }
                    _ => 0,
                };

                runtime.status = QuizStatus::Completed;
                runtime.ended_at = Some(OffsetDateTime::now_utc());
                store.upsert_runtime(runtime.clone()).await?;

                let mut quiz = quiz;
                quiz.status = QuizStatus::Completed;
                store.update_quiz(quiz).await?;
                Ok((runtime, graded_count))
            }
        },
    )
    .await?;

    Ok(TransitionResponse {
        quiz_id,
        status: runtime.status,
        current_question_index: Some(runtime.current_question_index),
        graded_count: Some(graded_count),
    })
}

/// Load the quiz and check the caller drives it.
///
/// Transitions are the one place where authorization failures surface as
/// `Forbidden` rather than a generic not-found: the caller already knows the
/// session exists because they are looking at its host view.
async fn organizer_quiz(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<QuizEntity, ServiceError> {
    let store = state.require_store().await?;
    let Some(quiz) = store.find_quiz(quiz_id).await? else {
        return Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")));
    };
    if quiz.organizer_id != organizer_id {
        return Err(ServiceError::Forbidden(
            "only the session's organizer may drive transitions".into(),
        ));
    }
    Ok(quiz)
}
