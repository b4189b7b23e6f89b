use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::quiz::{CreateQuizRequest, QuestionInput, QuestionSummary, QuizDetail, QuizSummary},
    error::AppError,
    routes::extract::Caller,
    services::quiz_service,
    state::SharedState,
};

/// Routes handling quiz and question authoring.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quizzes", post(create_quiz).get(list_quizzes))
        .route("/quizzes/{id}", get(get_quiz).delete(delete_quiz))
        .route("/quizzes/{id}/questions", post(add_question))
        .route(
            "/quizzes/{id}/questions/{question_id}",
            put(update_question).delete(delete_question),
        )
}

/// Create a new quiz in draft with a freshly reserved room code.
#[utoipa::path(
    post,
    path = "/quizzes",
    tag = "authoring",
    request_body = CreateQuizRequest,
    params(("x-user-id" = String, Header, description = "Opaque caller identifier")),
    responses(
        (status = 200, description = "Quiz created", body = QuizSummary),
        (status = 400, description = "Invalid quiz definition"),
        (status = 409, description = "Room code space exhausted")
    )
)]
pub async fn create_quiz(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<Json<QuizSummary>, AppError> {
    payload.validate()?;
    let summary = quiz_service::create_quiz(&state, &organizer_id, payload).await?;
    Ok(Json(summary))
}

/// List the caller's quizzes.
#[utoipa::path(
    get,
    path = "/quizzes",
    tag = "authoring",
    params(("x-user-id" = String, Header, description = "Opaque caller identifier")),
    responses((status = 200, description = "Owned quizzes", body = [QuizSummary]))
)]
pub async fn list_quizzes(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    let summaries = quiz_service::list_quizzes(&state, &organizer_id).await?;
    Ok(Json(summaries))
}

/// Fetch one owned quiz with its questions and answer keys.
#[utoipa::path(
    get,
    path = "/quizzes/{id}",
    tag = "authoring",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Quiz detail", body = QuizDetail),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn get_quiz(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizDetail>, AppError> {
    let detail = quiz_service::get_quiz(&state, &organizer_id, id).await?;
    Ok(Json(detail))
}

/// Delete an owned quiz that is not currently running.
#[utoipa::path(
    delete,
    path = "/quizzes/{id}",
    tag = "authoring",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 404, description = "Quiz not found"),
        (status = 409, description = "Quiz is currently running")
    )
)]
pub async fn delete_quiz(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    quiz_service::delete_quiz(&state, &organizer_id, id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Append a question to an owned draft quiz.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/questions",
    tag = "authoring",
    request_body = QuestionInput,
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Question added", body = QuestionSummary),
        (status = 400, description = "Malformed question"),
        (status = 409, description = "Quiz is not a draft")
    )
)]
pub async fn add_question(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionInput>,
) -> Result<Json<QuestionSummary>, AppError> {
    payload.validate()?;
    let summary = quiz_service::add_question(&state, &organizer_id, id, payload).await?;
    Ok(Json(summary))
}

/// Replace a question's content, keeping its position.
#[utoipa::path(
    put,
    path = "/quizzes/{id}/questions/{question_id}",
    tag = "authoring",
    request_body = QuestionInput,
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("question_id" = Uuid, Path, description = "Question identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Question updated", body = QuestionSummary),
        (status = 404, description = "Question not found")
    )
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuestionInput>,
) -> Result<Json<QuestionSummary>, AppError> {
    payload.validate()?;
    let summary =
        quiz_service::update_question(&state, &organizer_id, id, question_id, payload).await?;
    Ok(Json(summary))
}

/// Remove a question from an owned draft quiz.
#[utoipa::path(
    delete,
    path = "/quizzes/{id}/questions/{question_id}",
    tag = "authoring",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("question_id" = Uuid, Path, description = "Question identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<axum::http::StatusCode, AppError> {
    quiz_service::delete_question(&state, &organizer_id, id, question_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
