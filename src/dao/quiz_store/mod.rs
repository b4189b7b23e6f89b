/// In-memory store backend.
pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, ParticipantEntity, QuestionEntity, QuizEntity, RuntimeStateEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence collaborator for quizzes, questions,
/// runtime state, participants, and answers.
///
/// Uniqueness constraints are surfaced as boolean returns instead of errors so
/// callers can translate them into their own conflict semantics: room codes
/// are unique among non-completed quizzes, answers are write-once per
/// `(quiz, question, user)`, and grading marks apply at most once.
pub trait QuizStore: Send + Sync {
    /// Insert a new quiz. Returns `false` when the room code is already held
    /// by a non-completed quiz.
    fn insert_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Replace an existing quiz record.
    fn update_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Point-read a quiz by id.
    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Look up the quiz currently holding a room code.
    fn find_quiz_by_room_code(
        &self,
        code: &str,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// List all quizzes owned by an organizer, newest first.
    fn list_quizzes_by_organizer(
        &self,
        organizer_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>>;
    /// Delete a quiz and everything hanging off it. Returns `false` when the
    /// quiz did not exist.
    fn delete_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace a question (matched by id within its quiz).
    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// List a quiz's questions ordered by position.
    fn list_questions(&self, quiz_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Point-read one question of a quiz.
    fn find_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Remove a question and renumber the remaining positions so they stay
    /// zero-based and contiguous. Returns `false` when it did not exist.
    fn delete_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace the runtime record of a quiz.
    fn upsert_runtime(&self, runtime: RuntimeStateEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Point-read the runtime record of a quiz.
    fn find_runtime(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RuntimeStateEntity>>>;

    /// Idempotent join: insert the participant unless the `(quiz, user)` pair
    /// already exists. Returns the stored row and whether it was created.
    fn upsert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<(ParticipantEntity, bool)>>;
    /// List a quiz's participants in join order.
    fn list_participants(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Atomically add `delta` to a participant's cumulative score, returning
    /// the new total.
    fn increment_participant_score(
        &self,
        quiz_id: Uuid,
        user_id: &str,
        delta: u32,
    ) -> BoxFuture<'static, StorageResult<u32>>;

    /// Write-once insert keyed by `(quiz, question, user)`. Returns `false`
    /// when a submission for that key already exists.
    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// List every submission for one question, oldest first.
    fn list_answers_for_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;
    /// Record a grading outcome on a submission. Returns `false` when the
    /// submission was already graded, in which case nothing is written.
    fn mark_answer_graded(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
        user_id: &str,
        is_correct: bool,
        points: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap liveness probe used by the health endpoint.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
