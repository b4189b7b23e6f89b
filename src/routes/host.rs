use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;

use crate::{
    dto::host::TransitionResponse,
    error::AppError,
    routes::extract::Caller,
    services::lifecycle_service,
    state::SharedState,
};

/// Routes driving a session's lifecycle; all require the organizer.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quizzes/{id}/start", post(start_session))
        .route("/quizzes/{id}/pause", post(pause_session))
        .route("/quizzes/{id}/advance", post(advance_session))
        .route("/quizzes/{id}/end", post(end_session))
}

/// Start a draft session or resume a paused one.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/start",
    tag = "host",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Session started", body = TransitionResponse),
        (status = 400, description = "Quiz has no questions"),
        (status = 403, description = "Caller is not the organizer"),
        (status = 409, description = "Transition not valid from the current status")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let response = lifecycle_service::start(&state, &organizer_id, id).await?;
    Ok(Json(response))
}

/// Pause an active session.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/pause",
    tag = "host",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Session paused", body = TransitionResponse),
        (status = 403, description = "Caller is not the organizer"),
        (status = 409, description = "Transition not valid from the current status")
    )
)]
pub async fn pause_session(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let response = lifecycle_service::pause(&state, &organizer_id, id).await?;
    Ok(Json(response))
}

/// Grade the current question and move to the next one; past the last
/// question this completes the session.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/advance",
    tag = "host",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Question advanced or session completed", body = TransitionResponse),
        (status = 400, description = "A question is missing its answer key"),
        (status = 403, description = "Caller is not the organizer"),
        (status = 409, description = "Transition not valid from the current status")
    )
)]
pub async fn advance_session(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let response = lifecycle_service::advance(&state, &organizer_id, id).await?;
    Ok(Json(response))
}

/// End the session, grading the current question first.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/end",
    tag = "host",
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Session completed", body = TransitionResponse),
        (status = 403, description = "Caller is not the organizer"),
        (status = 409, description = "Transition not valid from the current status")
    )
)]
pub async fn end_session(
    State(state): State<SharedState>,
    Caller(organizer_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let response = lifecycle_service::end(&state, &organizer_id, id).await?;
    Ok(Json(response))
}
