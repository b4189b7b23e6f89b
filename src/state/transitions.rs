use uuid::Uuid;

use crate::{
    dao::models::QuizStatus,
    error::ServiceError,
    services::sse_events::broadcast_phase_changed,
    state::{SessionEvent, SharedState},
};

/// Execute one session transition, then broadcast the resulting state change
/// to that session's subscribers.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    quiz_id: Uuid,
    hydrate: QuizStatus,
    event: SessionEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce(QuizStatus) -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (res, _next) = state
        .run_session_transition(quiz_id, hydrate, event, work)
        .await?;
    broadcast_phase_changed(state, quiz_id).await;
    Ok(res)
}
