//! Room-code generation and join resolution.

use rand::Rng;
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    dao::{
        models::{ParticipantEntity, QuizEntity},
        quiz_store::QuizStore,
    },
    dto::validation::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH, validate_room_code},
    error::ServiceError,
    state::SharedState,
};

/// Draw a random room code from the unambiguous alphabet.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Insert `quiz` under a freshly generated room code, retrying on collision
/// with any non-completed quiz until the configured attempts run out.
pub async fn reserve_quiz(
    state: &SharedState,
    mut quiz: QuizEntity,
) -> Result<QuizEntity, ServiceError> {
    let store = state.require_store().await?;
    let attempts = state.config().room_code_attempts;

    for attempt in 0..attempts {
        quiz.room_code = generate_room_code();
        // The store enforces uniqueness among non-completed quizzes, so a
        // `true` here is an atomic check-and-reserve.
        if store.insert_quiz(quiz.clone()).await? {
            debug!(quiz_id = %quiz.id, code = %quiz.room_code, attempt, "reserved room code");
            return Ok(quiz);
        }
    }

    Err(ServiceError::CodeSpaceExhausted { attempts })
}

/// Resolve a human-typed room code to its session and idempotently enroll
/// the caller as a participant.
///
/// Returns the quiz, the caller's roster entry, and whether the entry was
/// newly created. Joining twice yields the same row and session id both
/// times.
pub async fn resolve_join(
    state: &SharedState,
    code: &str,
    user_id: &str,
    display_name: &str,
) -> Result<(QuizEntity, ParticipantEntity, bool), ServiceError> {
    let normalized = code.trim().to_uppercase();
    validate_room_code(&normalized).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| "invalid room code".into()),
        )
    })?;

    let store = state.require_store().await?;
    let Some(quiz) = store.find_quiz_by_room_code(&normalized).await? else {
        // Deliberately generic: do not reveal whether the code ever existed.
        return Err(ServiceError::NotFound("no session with that room code".into()));
    };
    if quiz.status.is_terminal() {
        return Err(ServiceError::AlreadyCompleted);
    }

    let (participant, newly_joined) = store
        .upsert_participant(ParticipantEntity {
            quiz_id: quiz.id,
            user_id: user_id.to_string(),
            display_name: display_name.trim().to_string(),
            score: 0,
            joined_at: OffsetDateTime::now_utc(),
        })
        .await?;

    Ok((quiz, participant, newly_joined))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::QuizStatus, quiz_store::memory::MemoryStore},
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    fn draft_quiz() -> QuizEntity {
        QuizEntity {
            id: Uuid::new_v4(),
            organizer_id: "org-1".into(),
            title: "Capitals".into(),
            description: None,
            category: None,
            room_code: String::new(),
            status: QuizStatus::Draft,
            time_limit_secs: 30,
            base_points: 10,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn generated_codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert!(validate_room_code(&code).is_ok(), "bad code {code}");
        }
    }

    #[tokio::test]
    async fn reserved_quizzes_get_distinct_codes() {
        let state = test_state().await;
        let first = reserve_quiz(&state, draft_quiz()).await.unwrap();
        let second = reserve_quiz(&state, draft_quiz()).await.unwrap();
        assert_ne!(first.room_code, second.room_code);
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let state = test_state().await;
        let quiz = reserve_quiz(&state, draft_quiz()).await.unwrap();

        let (resolved_a, _, first) = resolve_join(&state, &quiz.room_code, "u1", "Alice")
            .await
            .unwrap();
        let (resolved_b, row, second) = resolve_join(&state, &quiz.room_code, "u1", "Alice")
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(resolved_a.id, quiz.id);
        assert_eq!(resolved_b.id, quiz.id);
        assert_eq!(row.display_name, "Alice");

        let store = state.require_store().await.unwrap();
        assert_eq!(store.list_participants(quiz.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn join_accepts_lowercase_codes() {
        let state = test_state().await;
        let quiz = reserve_quiz(&state, draft_quiz()).await.unwrap();
        let lowered = quiz.room_code.to_lowercase();
        let (resolved, _, _) = resolve_join(&state, &lowered, "u1", "Alice").await.unwrap();
        assert_eq!(resolved.id, quiz.id);
    }

    #[tokio::test]
    async fn unknown_code_is_a_generic_not_found() {
        let state = test_state().await;
        let err = resolve_join(&state, "ZZZZZZ", "u1", "Alice").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn completed_sessions_reject_joins() {
        let state = test_state().await;
        let mut quiz = reserve_quiz(&state, draft_quiz()).await.unwrap();

        quiz.status = QuizStatus::Completed;
        let store = state.require_store().await.unwrap();
        store.update_quiz(quiz.clone()).await.unwrap();

        let err = resolve_join(&state, &quiz.room_code, "u1", "Alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyCompleted));
    }
}
