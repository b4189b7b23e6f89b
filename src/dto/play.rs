use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ParticipantSummary;

/// Payload a participant sends to join a session by room code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRequest {
    /// Human-typed room code; normalized to uppercase before lookup.
    #[validate(length(min = 1, max = 16))]
    pub code: String,
    /// Name to show on the leaderboard.
    #[validate(length(min = 1, max = 50))]
    pub display_name: String,
}

/// Response to a successful (or repeated) join.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    /// Session the code resolved to; the client navigates to its play view.
    pub quiz_id: Uuid,
    /// The caller's roster entry.
    pub participant: ParticipantSummary,
}

/// One answer submission for the current question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Question being answered; must match the session's current question.
    pub question_id: Uuid,
    /// Submitted value(s): one element for single-choice and text questions,
    /// the full selected subset for multiple choice.
    #[validate(length(min = 1, max = 32))]
    pub values: Vec<String>,
}

/// Acknowledgement of a stored submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerReceipt {
    /// Identifier of the stored submission.
    pub answer_id: Uuid,
    /// Question the submission belongs to.
    pub question_id: Uuid,
    /// RFC 3339 submission timestamp.
    pub submitted_at: String,
}

/// One leaderboard row.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// One-based rank; earlier joiners win score ties.
    pub rank: usize,
    /// Opaque user identifier.
    pub user_id: String,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Cumulative score.
    pub score: u32,
}

/// Leaderboard of one session ordered by score.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Session the leaderboard belongs to.
    pub quiz_id: Uuid,
    /// Rows ordered best first.
    pub entries: Vec<LeaderboardEntry>,
}
