//! Typed event construction and broadcasting for the per-session SSE fan-out.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::ParticipantSummary,
        sse::{ParticipantJoinedEvent, PhaseChangedEvent, ScoreUpdatedEvent, ServerEvent},
    },
    services::play_service,
    state::SharedState,
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_PARTICIPANT_JOINED: &str = "participant.joined";
const EVENT_SCORE_UPDATED: &str = "score.updated";

/// Broadcast the session's full snapshot after a state-machine transition.
///
/// Best effort: when the snapshot cannot be built the event is dropped with a
/// warning, and subscribers recover through the poll fallback.
pub async fn broadcast_phase_changed(state: &SharedState, quiz_id: Uuid) {
    match play_service::session_snapshot(state, quiz_id).await {
        Ok(snapshot) => send_session_event(
            state,
            quiz_id,
            EVENT_PHASE_CHANGED,
            &PhaseChangedEvent(snapshot),
        ),
        Err(err) => warn!(%quiz_id, error = %err, "failed to build phase change snapshot"),
    }
}

/// Broadcast a new roster entry to the session's subscribers.
pub fn broadcast_participant_joined(
    state: &SharedState,
    quiz_id: Uuid,
    participant: ParticipantSummary,
) {
    let payload = ParticipantJoinedEvent { participant };
    send_session_event(state, quiz_id, EVENT_PARTICIPANT_JOINED, &payload);
}

/// Broadcast a participant's new cumulative score after grading.
pub fn broadcast_score_updated(
    state: &SharedState,
    quiz_id: Uuid,
    participant: ParticipantSummary,
) {
    let payload = ScoreUpdatedEvent { participant };
    send_session_event(state, quiz_id, EVENT_SCORE_UPDATED, &payload);
}

fn send_session_event(state: &SharedState, quiz_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(quiz_id, event),
        Err(err) => warn!(%quiz_id, event, error = %err, "failed to serialize SSE payload"),
    }
}
