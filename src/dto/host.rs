use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::QuizStatus;

/// Outcome of an organizer-driven session transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    /// Session the transition applied to.
    pub quiz_id: Uuid,
    /// Status after the transition.
    pub status: QuizStatus,
    /// Current question index once the session has started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    /// Submissions graded by this transition, for `advance` and `end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_count: Option<usize>,
}
