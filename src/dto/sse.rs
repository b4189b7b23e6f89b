use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::common::{ParticipantSummary, SessionSnapshot};

#[derive(Clone, Debug)]
/// Dispatched payload carried across per-session SSE channels.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Session the stream is scoped to.
    pub quiz_id: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the session's runtime state changes; carries the full
/// snapshot so clients can re-render without an extra round trip.
pub struct PhaseChangedEvent(pub SessionSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant joins the roster.
pub struct ParticipantJoinedEvent {
    /// The new roster entry.
    pub participant: ParticipantSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when grading updates a participant's cumulative score.
pub struct ScoreUpdatedEvent {
    /// The roster entry with its new score.
    pub participant: ParticipantSummary,
}
