use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/quizzes/{id}/events",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Quiz identifier")),
    responses((status = 200, description = "Per-session event stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime session events to host and participant views.
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state, id);
    info!(quiz_id = %id, "new session SSE connection");
    sse_service::broadcast_handshake(&state, id).await;
    sse_service::to_sse_stream(receiver, id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/quizzes/{id}/events", get(session_stream))
}
