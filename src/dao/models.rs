//! Record definitions shared by every [`QuizStore`](crate::dao::quiz_store::QuizStore) backend.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status shared by the quiz record and its runtime record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    /// Authoring in progress; questions can still be edited.
    Draft,
    /// Session is live and accepting answers for the current question.
    Active,
    /// Session is live but answering is suspended.
    Paused,
    /// Session has ended; the record is read-only from here on.
    Completed,
}

impl QuizStatus {
    /// Whether this status is terminal (no transition leaves it).
    pub fn is_terminal(self) -> bool {
        matches!(self, QuizStatus::Completed)
    }
}

/// Question kinds the grader knows how to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option is correct.
    SingleChoice,
    /// A subset of the options is correct; the full subset must be submitted.
    MultipleChoice,
    /// Free-text answer matched case- and whitespace-insensitively.
    Text,
}

/// One authored quiz definition.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: Uuid,
    /// Opaque identifier of the organizer who owns this quiz.
    pub organizer_id: String,
    /// Display title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
    /// Six-character join code, unique among non-completed quizzes.
    pub room_code: String,
    /// Current lifecycle status.
    pub status: QuizStatus,
    /// Per-question answering window in seconds.
    pub time_limit_secs: u32,
    /// Base points awarded for a correct answer before the speed bonus.
    pub base_points: u32,
    /// Creation timestamp for auditing.
    pub created_at: OffsetDateTime,
}

/// Ordered question belonging to exactly one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Quiz this question belongs to.
    pub quiz_id: Uuid,
    /// Question text shown to participants.
    pub text: String,
    /// Optional image reference carried as an opaque URL.
    pub image_url: Option<String>,
    /// Question kind driving grading dispatch.
    pub kind: QuestionKind,
    /// Option strings; empty for [`QuestionKind::Text`].
    pub options: Vec<String>,
    /// Answer key; never exposed to participants.
    pub correct_answers: Vec<String>,
    /// Zero-based position, contiguous and unique within the quiz.
    pub position: usize,
}

/// Authoritative runtime record of one in-progress session.
///
/// Upserted on every transition and never deleted so completed sessions keep
/// their timestamps for post-hoc scoring review.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeStateEntity {
    /// Quiz this runtime record belongs to (at most one per quiz).
    pub quiz_id: Uuid,
    /// Status mirror; kept in sync with [`QuizEntity::status`] by transitions.
    pub status: QuizStatus,
    /// Index of the question currently shown, monotonically non-decreasing.
    pub current_question_index: usize,
    /// Stable reference to the current question, immune to index drift.
    pub current_question_id: Option<Uuid>,
    /// When the current question was (re)opened for answers.
    pub question_started_at: Option<OffsetDateTime>,
    /// When the session first left `draft`.
    pub started_at: Option<OffsetDateTime>,
    /// When the session reached `completed`.
    pub ended_at: Option<OffsetDateTime>,
}

/// One user's membership in one quiz session.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantEntity {
    /// Quiz joined.
    pub quiz_id: Uuid,
    /// Opaque identifier supplied by the identity collaborator.
    pub user_id: String,
    /// Name shown on the leaderboard.
    pub display_name: String,
    /// Cumulative score; mutated only by the grader's atomic increments.
    pub score: u32,
    /// Join timestamp, used as the leaderboard tiebreak.
    pub joined_at: OffsetDateTime,
}

/// One participant's single submission for one question.
///
/// Write-once per `(quiz, question, user)`; correctness and points stay unset
/// until the grader processes the question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEntity {
    /// Primary key of the submission.
    pub id: Uuid,
    /// Quiz the answered question belongs to.
    pub quiz_id: Uuid,
    /// Question answered.
    pub question_id: Uuid,
    /// Submitting user.
    pub user_id: String,
    /// Submitted value(s); a single element except for multiple choice.
    pub values: Vec<String>,
    /// Grading verdict, `None` until graded.
    pub is_correct: Option<bool>,
    /// Points awarded, `None` until graded.
    pub points_earned: Option<u32>,
    /// Submission timestamp used for the speed bonus.
    pub submitted_at: OffsetDateTime,
}

impl AnswerEntity {
    /// Whether the grader already processed this submission.
    pub fn is_graded(&self) -> bool {
        self.is_correct.is_some()
    }
}
