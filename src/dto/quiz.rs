use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{QuestionEntity, QuestionKind, QuizEntity, QuizStatus},
    dto::{format_timestamp, validation::validate_question_payload},
};

/// Payload used to create a new quiz definition.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateQuizRequest {
    /// Display title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Optional category label.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Per-question answering window in seconds; bounds come from the server
    /// configuration.
    pub time_limit_secs: u32,
    /// Base points per question; bounds come from the server configuration.
    pub base_points: u32,
}

/// Incoming question definition for the authoring endpoints.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// Question text shown to participants.
    pub text: String,
    /// Optional image reference carried as an opaque URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Question kind.
    pub kind: QuestionKind,
    /// Options to pick from; must be empty for text questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// Answer key; choice answers must be drawn from the options.
    pub correct_answers: Vec<String>,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let text = self.text.trim();
        if text.is_empty() || text.len() > 500 {
            let mut err = validator::ValidationError::new("text_length");
            err.message = Some("Question text must be between 1 and 500 characters".into());
            errors.add("text", err);
        }

        if let Err(e) = validate_question_payload(self.kind, &self.options, &self.correct_answers)
        {
            errors.add("options", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Summary returned for quiz listings and creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizSummary {
    /// Quiz identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional category label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Join code participants type in.
    pub room_code: String,
    /// Lifecycle status.
    pub status: QuizStatus,
    /// Per-question answering window in seconds.
    pub time_limit_secs: u32,
    /// Base points per question.
    pub base_points: u32,
    /// Number of authored questions.
    pub question_count: usize,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<(QuizEntity, usize)> for QuizSummary {
    fn from((quiz, question_count): (QuizEntity, usize)) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            category: quiz.category,
            room_code: quiz.room_code,
            status: quiz.status,
            time_limit_secs: quiz.time_limit_secs,
            base_points: quiz.base_points,
            question_count,
            created_at: format_timestamp(quiz.created_at),
        }
    }
}

/// Organizer-facing question projection, answer key included.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    /// Question identifier.
    pub id: Uuid,
    /// Question text.
    pub text: String,
    /// Optional image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Question kind.
    pub kind: QuestionKind,
    /// Options to pick from.
    pub options: Vec<String>,
    /// Answer key (organizer view only).
    pub correct_answers: Vec<String>,
    /// Zero-based position within the quiz.
    pub position: usize,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            image_url: value.image_url,
            kind: value.kind,
            options: value.options,
            correct_answers: value.correct_answers,
            position: value.position,
        }
    }
}

/// Full organizer view of one quiz with its questions in order.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizDetail {
    /// Quiz metadata.
    pub quiz: QuizSummary,
    /// Questions in position order, answer keys included.
    pub questions: Vec<QuestionSummary>,
}
