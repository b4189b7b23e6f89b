use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::SessionSnapshot,
        play::{AnswerReceipt, JoinRequest, JoinResponse, LeaderboardResponse, SubmitAnswerRequest},
    },
    error::AppError,
    routes::extract::Caller,
    services::play_service,
    state::SharedState,
};

/// Participant-facing routes: joining, answering, and read-only views.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/join", post(join_session))
        .route("/quizzes/{id}/state", get(session_state))
        .route("/quizzes/{id}/answers", post(submit_answer))
        .route("/quizzes/{id}/leaderboard", get(leaderboard))
}

/// Join a session by room code; joining twice is a no-op.
#[utoipa::path(
    post,
    path = "/join",
    tag = "play",
    request_body = JoinRequest,
    params(("x-user-id" = String, Header, description = "Opaque caller identifier")),
    responses(
        (status = 200, description = "Joined (or already a member)", body = JoinResponse),
        (status = 404, description = "No session with that room code"),
        (status = 409, description = "Session already completed")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Caller(user_id): Caller,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    payload.validate()?;
    let response = play_service::join(&state, &user_id, payload).await?;
    Ok(Json(response))
}

/// Authoritative session snapshot used for initial render and as the
/// reconciliation fallback for missed SSE events.
#[utoipa::path(
    get,
    path = "/quizzes/{id}/state",
    tag = "play",
    params(("id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Current session state", body = SessionSnapshot),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn session_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = play_service::session_snapshot(&state, id).await?;
    Ok(Json(snapshot))
}

/// Submit an answer for the session's current question.
#[utoipa::path(
    post,
    path = "/quizzes/{id}/answers",
    tag = "play",
    request_body = SubmitAnswerRequest,
    params(
        ("id" = Uuid, Path, description = "Quiz identifier"),
        ("x-user-id" = String, Header, description = "Opaque caller identifier")
    ),
    responses(
        (status = 200, description = "Answer stored", body = AnswerReceipt),
        (status = 403, description = "Caller has not joined the session"),
        (status = 409, description = "Already answered, or not the current question")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerReceipt>, AppError> {
    payload.validate()?;
    let receipt = play_service::submit_answer(&state, &user_id, id, payload).await?;
    Ok(Json(receipt))
}

/// Leaderboard ordered by score, earliest joiner first on ties.
#[utoipa::path(
    get,
    path = "/quizzes/{id}/leaderboard",
    tag = "play",
    params(("id" = Uuid, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Current leaderboard", body = LeaderboardResponse),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let board = play_service::leaderboard(&state, id).await?;
    Ok(Json(board))
}
