/// OpenAPI documentation generation.
pub mod documentation;
/// Answer grading and score application.
pub mod grading_service;
/// Health check service.
pub mod health_service;
/// Organizer-driven session lifecycle transitions.
pub mod lifecycle_service;
/// Participant-facing play operations.
pub mod play_service;
/// Quiz and question authoring.
pub mod quiz_service;
/// Room-code generation and join resolution.
pub mod room_service;
/// Pure scoring rules.
pub mod scoring;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
