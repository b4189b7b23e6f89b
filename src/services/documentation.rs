use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::session_stream,
        crate::routes::quiz::create_quiz,
        crate::routes::quiz::list_quizzes,
        crate::routes::quiz::get_quiz,
        crate::routes::quiz::delete_quiz,
        crate::routes::quiz::add_question,
        crate::routes::quiz::update_question,
        crate::routes::quiz::delete_question,
        crate::routes::host::start_session,
        crate::routes::host::pause_session,
        crate::routes::host::advance_session,
        crate::routes::host::end_session,
        crate::routes::play::join_session,
        crate::routes::play::session_state,
        crate::routes::play::submit_answer,
        crate::routes::play::leaderboard,
    ),
    components(
        schemas(
            crate::dao::models::QuizStatus,
            crate::dao::models::QuestionKind,
            crate::dto::health::HealthResponse,
            crate::dto::common::ParticipantSummary,
            crate::dto::common::QuestionSnapshot,
            crate::dto::common::SessionSnapshot,
            crate::dto::quiz::CreateQuizRequest,
            crate::dto::quiz::QuestionInput,
            crate::dto::quiz::QuizSummary,
            crate::dto::quiz::QuestionSummary,
            crate::dto::quiz::QuizDetail,
            crate::dto::play::JoinRequest,
            crate::dto::play::JoinResponse,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::AnswerReceipt,
            crate::dto::play::LeaderboardEntry,
            crate::dto::play::LeaderboardResponse,
            crate::dto::host::TransitionResponse,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "authoring", description = "Quiz and question authoring"),
        (name = "host", description = "Organizer-driven session transitions"),
        (name = "play", description = "Participant join, answers, and views"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
