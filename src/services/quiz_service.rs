//! Quiz and question authoring. All mutations here are organizer-gated and,
//! for questions, only legal while the quiz is still a draft.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::{
        models::{QuestionEntity, QuizEntity, QuizStatus},
        quiz_store::QuizStore,
    },
    dto::{
        quiz::{CreateQuizRequest, QuestionInput, QuestionSummary, QuizDetail, QuizSummary},
        validation::validate_question_payload,
    },
    error::ServiceError,
    services::room_service,
    state::SharedState,
};

/// Create a quiz in `draft` with a freshly reserved room code.
pub async fn create_quiz(
    state: &SharedState,
    organizer_id: &str,
    request: CreateQuizRequest,
) -> Result<QuizSummary, ServiceError> {
    let config = state.config();

    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ServiceError::InvalidInput("title must not be empty".into()));
    }
    if !(config.min_time_limit_secs..=config.max_time_limit_secs)
        .contains(&request.time_limit_secs)
    {
        return Err(ServiceError::InvalidInput(format!(
            "time limit must be between {} and {} seconds",
            config.min_time_limit_secs, config.max_time_limit_secs
        )));
    }
    if !(config.min_base_points..=config.max_base_points).contains(&request.base_points) {
        return Err(ServiceError::InvalidInput(format!(
            "base points must be between {} and {}",
            config.min_base_points, config.max_base_points
        )));
    }

    let quiz = QuizEntity {
        id: Uuid::new_v4(),
        organizer_id: organizer_id.to_string(),
        title,
        description: request.description.filter(|text| !text.trim().is_empty()),
        category: request.category.filter(|text| !text.trim().is_empty()),
        // Filled in by the reservation loop below.
        room_code: String::new(),
        status: QuizStatus::Draft,
        time_limit_secs: request.time_limit_secs,
        base_points: request.base_points,
        created_at: OffsetDateTime::now_utc(),
    };

    let quiz = room_service::reserve_quiz(state, quiz).await?;
    Ok((quiz, 0).into())
}

/// List the caller's quizzes, newest first.
pub async fn list_quizzes(
    state: &SharedState,
    organizer_id: &str,
) -> Result<Vec<QuizSummary>, ServiceError> {
    let store = state.require_store().await?;
    let quizzes = store.list_quizzes_by_organizer(organizer_id).await?;

    let mut summaries = Vec::with_capacity(quizzes.len());
    for quiz in quizzes {
        let question_count = store.list_questions(quiz.id).await?.len();
        summaries.push((quiz, question_count).into());
    }
    Ok(summaries)
}

/// Fetch one owned quiz with its questions, answer keys included.
pub async fn get_quiz(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<QuizDetail, ServiceError> {
    let store = state.require_store().await?;
    let quiz = owned_quiz(store.as_ref(), organizer_id, quiz_id).await?;
    let questions = store.list_questions(quiz_id).await?;

    Ok(QuizDetail {
        quiz: (quiz, questions.len()).into(),
        questions: questions.into_iter().map(Into::into).collect(),
    })
}

/// Delete an owned quiz that is not currently running, along with its
/// questions, roster, answers, and in-memory session state.
pub async fn delete_quiz(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let quiz = owned_quiz(store.as_ref(), organizer_id, quiz_id).await?;

    if matches!(quiz.status, QuizStatus::Active | QuizStatus::Paused) {
        return Err(ServiceError::InvalidState(
            "cannot delete a session that is currently running".into(),
        ));
    }

    if store.delete_quiz(quiz_id).await? {
        state.forget_session(quiz_id);
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found")))
    }
}

/// Append a question to an owned draft quiz.
pub async fn add_question(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_store().await?;
    let quiz = owned_quiz(store.as_ref(), organizer_id, quiz_id).await?;
    ensure_draft(&quiz)?;
    validate_input(&input)?;

    let position = store.list_questions(quiz_id).await?.len();
    let question = build_question(Uuid::new_v4(), quiz_id, input, position);
    store.save_question(question.clone()).await?;

    Ok(question.into())
}

/// Replace the content of an existing question, keeping its position.
pub async fn update_question(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
    question_id: Uuid,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_store().await?;
    let quiz = owned_quiz(store.as_ref(), organizer_id, quiz_id).await?;
    ensure_draft(&quiz)?;
    validate_input(&input)?;

    let Some(existing) = store.find_question(quiz_id, question_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "question `{question_id}` not found"
        )));
    };

    let question = build_question(existing.id, quiz_id, input, existing.position);
    store.save_question(question.clone()).await?;

    Ok(question.into())
}

/// Remove a question from an owned draft quiz; the store keeps the remaining
/// positions contiguous.
pub async fn delete_question(
    state: &SharedState,
    organizer_id: &str,
    quiz_id: Uuid,
    question_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let quiz = owned_quiz(store.as_ref(), organizer_id, quiz_id).await?;
    ensure_draft(&quiz)?;

    if store.delete_question(quiz_id, question_id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "question `{question_id}` not found"
        )))
    }
}

/// Load a quiz owned by `organizer_id`.
///
/// Missing quiz and foreign quiz both map to the same generic not-found so
/// the existence of other organizers' quizzes never leaks.
async fn owned_quiz(
    store: &dyn QuizStore,
    organizer_id: &str,
    quiz_id: Uuid,
) -> Result<QuizEntity, ServiceError> {
    match store.find_quiz(quiz_id).await? {
        Some(quiz) if quiz.organizer_id == organizer_id => Ok(quiz),
        _ => Err(ServiceError::NotFound(format!("quiz `{quiz_id}` not found"))),
    }
}

fn ensure_draft(quiz: &QuizEntity) -> Result<(), ServiceError> {
    if quiz.status != QuizStatus::Draft {
        return Err(ServiceError::InvalidState(
            "questions can only be edited while the quiz is a draft".into(),
        ));
    }
    Ok(())
}

fn validate_input(input: &QuestionInput) -> Result<(), ServiceError> {
    if input.text.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "question text must not be empty".into(),
        ));
    }
    validate_question_payload(input.kind, &input.options, &input.correct_answers).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| "invalid question".into()),
        )
    })
}

fn build_question(
    id: Uuid,
    quiz_id: Uuid,
    input: QuestionInput,
    position: usize,
) -> QuestionEntity {
    QuestionEntity {
        id,
        quiz_id,
        text: input.text.trim().to_string(),
        image_url: input.image_url.filter(|url| !url.trim().is_empty()),
        kind: input.kind,
        options: input.options,
        correct_answers: input.correct_answers,
        position,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::QuestionKind, quiz_store::memory::MemoryStore},
        state::AppState,
    };

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryStore::new())).await;
        state
    }

    fn create_request() -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Capitals".into(),
            description: Some("European capitals".into()),
            category: None,
            time_limit_secs: 30,
            base_points: 10,
        }
    }

    fn question_input(correct: &str) -> QuestionInput {
        QuestionInput {
            text: "Pick one".into(),
            image_url: None,
            kind: QuestionKind::SingleChoice,
            options: vec!["A".into(), "B".into()],
            correct_answers: vec![correct.into()],
        }
    }

    #[tokio::test]
    async fn created_quiz_is_a_draft_with_a_valid_code() {
        let state = test_state().await;
        let summary = create_quiz(&state, "org-1", create_request()).await.unwrap();

        assert_eq!(summary.status, QuizStatus::Draft);
        assert_eq!(summary.question_count, 0);
        assert!(crate::dto::validation::validate_room_code(&summary.room_code).is_ok());
    }

    #[tokio::test]
    async fn quiz_bounds_are_enforced() {
        let state = test_state().await;

        let mut request = create_request();
        request.time_limit_secs = 5;
        assert!(matches!(
            create_quiz(&state, "org-1", request).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut request = create_request();
        request.base_points = 1000;
        assert!(matches!(
            create_quiz(&state, "org-1", request).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn questions_are_positioned_and_renumbered() {
        let state = test_state().await;
        let quiz = create_quiz(&state, "org-1", create_request()).await.unwrap();

        let first = add_question(&state, "org-1", quiz.id, question_input("A")).await.unwrap();
        let second = add_question(&state, "org-1", quiz.id, question_input("B")).await.unwrap();
        let third = add_question(&state, "org-1", quiz.id, question_input("A")).await.unwrap();
        assert_eq!((first.position, second.position, third.position), (0, 1, 2));

        delete_question(&state, "org-1", quiz.id, second.id).await.unwrap();
        let detail = get_quiz(&state, "org-1", quiz.id).await.unwrap();
        let positions: Vec<usize> = detail.questions.iter().map(|q| q.position).collect();
        assert_eq!(positions, vec![0, 1]);
        assert_eq!(detail.questions[1].id, third.id);
    }

    #[tokio::test]
    async fn foreign_quizzes_read_as_not_found() {
        let state = test_state().await;
        let quiz = create_quiz(&state, "org-1", create_request()).await.unwrap();

        assert!(matches!(
            get_quiz(&state, "org-2", quiz.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            add_question(&state, "org-2", quiz.id, question_input("A")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn editing_requires_draft_status() {
        let state = test_state().await;
        let summary = create_quiz(&state, "org-1", create_request()).await.unwrap();

        let store = state.require_store().await.unwrap();
        let mut quiz = store.find_quiz(summary.id).await.unwrap().unwrap();
        quiz.status = QuizStatus::Active;
        store.update_quiz(quiz).await.unwrap();

        assert!(matches!(
            add_question(&state, "org-1", summary.id, question_input("A")).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn malformed_questions_are_rejected() {
        let state = test_state().await;
        let quiz = create_quiz(&state, "org-1", create_request()).await.unwrap();

        let mut input = question_input("C");
        input.correct_answers = vec!["C".into()]; // not among the options
        assert!(matches!(
            add_question(&state, "org-1", quiz.id, input).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
