use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{ParticipantEntity, QuestionEntity, QuestionKind, QuizStatus},
    dto::format_timestamp,
};

/// Participant projection exposed to REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Opaque user identifier.
    pub user_id: String,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Cumulative score.
    pub score: u32,
    /// RFC 3339 join timestamp.
    pub joined_at: String,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            user_id: value.user_id,
            display_name: value.display_name,
            score: value.score,
            joined_at: format_timestamp(value.joined_at),
        }
    }
}

/// Sanitized question projection: never carries the answer key.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct QuestionSnapshot {
    /// Question identifier.
    pub id: Uuid,
    /// Zero-based position within the quiz.
    pub position: usize,
    /// Question text.
    pub text: String,
    /// Optional image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Question kind.
    pub kind: QuestionKind,
    /// Options to pick from; empty for text questions.
    pub options: Vec<String>,
}

impl From<QuestionEntity> for QuestionSnapshot {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            position: value.position,
            text: value.text,
            image_url: value.image_url,
            kind: value.kind,
            options: value.options,
        }
    }
}

/// Full state of one session, carried by SSE events and the snapshot
/// endpoint so clients can re-render without extra round trips.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub quiz_id: Uuid,
    /// Lifecycle status.
    pub status: QuizStatus,
    /// Join code of the session.
    pub room_code: String,
    /// Per-question answering window in seconds.
    pub time_limit_secs: u32,
    /// Base points per question.
    pub base_points: u32,
    /// Total number of questions.
    pub question_count: usize,
    /// Index of the current question once the session started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    /// When the current question was opened for answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_started_at: Option<String>,
    /// When the session left `draft`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// When the session completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    /// The current question while the session is active or paused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionSnapshot>,
    /// Roster with scores, in join order.
    pub participants: Vec<ParticipantSummary>,
}
