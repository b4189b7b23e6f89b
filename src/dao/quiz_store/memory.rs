//! In-memory [`QuizStore`] backend.
//!
//! Serves as the default persistence collaborator: every method resolves
//! synchronously over sharded maps, with the uniqueness and atomicity
//! guarantees the trait requires enforced through per-key entry locks.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, ParticipantEntity, QuestionEntity, QuizEntity, RuntimeStateEntity,
};
use crate::dao::quiz_store::QuizStore;
use crate::dao::storage::{StorageError, StorageResult};

/// Key identifying one submission: `(quiz, question, user)`.
type AnswerKey = (Uuid, Uuid, String);

/// Map-backed store holding all quiz state in process memory.
#[derive(Default)]
pub struct MemoryStore {
    quizzes: DashMap<Uuid, QuizEntity>,
    /// Questions per quiz, kept sorted by position.
    questions: DashMap<Uuid, Vec<QuestionEntity>>,
    runtime: DashMap<Uuid, RuntimeStateEntity>,
    /// Participants per quiz keyed by user id, in join order; score updates
    /// mutate in place under the shard lock, which makes increments atomic.
    participants: DashMap<Uuid, IndexMap<String, ParticipantEntity>>,
    answers: DashMap<AnswerKey, AnswerEntity>,
    /// Room code registry; an entry is reclaimable once its holder completes.
    room_codes: DashMap<String, Uuid>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `holder` still blocks reuse of its room code.
    ///
    /// A holder that is not in the quizzes map yet is mid-insert, so its code
    /// counts as held; stale entries are cleaned up on quiz deletion.
    fn code_still_held(&self, holder: Uuid) -> bool {
        self.quizzes
            .get(&holder)
            .map(|quiz| !quiz.status.is_terminal())
            .unwrap_or(true)
    }
}

impl QuizStore for MemoryStore {
    fn insert_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inserted = match self.room_codes.entry(quiz.room_code.clone()) {
            Entry::Occupied(mut slot) => {
                if self.code_still_held(*slot.get()) {
                    false
                } else {
                    slot.insert(quiz.id);
                    true
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(quiz.id);
                true
            }
        };

        if inserted {
            self.quizzes.insert(quiz.id, quiz);
        }
        futures::future::ready(Ok(inserted)).boxed()
    }

    fn update_quiz(&self, quiz: QuizEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = if self.quizzes.contains_key(&quiz.id) {
            self.quizzes.insert(quiz.id, quiz);
            Ok(())
        } else {
            Err(StorageError::missing_row(format!(
                "quiz `{}` does not exist",
                quiz.id
            )))
        };
        futures::future::ready(result).boxed()
    }

    fn find_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let found = self.quizzes.get(&id).map(|entry| entry.clone());
        futures::future::ready(Ok(found)).boxed()
    }

    fn find_quiz_by_room_code(
        &self,
        code: &str,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let found = self
            .room_codes
            .get(code)
            .and_then(|holder| self.quizzes.get(&holder).map(|entry| entry.clone()));
        futures::future::ready(Ok(found)).boxed()
    }

    fn list_quizzes_by_organizer(
        &self,
        organizer_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let mut owned: Vec<QuizEntity> = self
            .quizzes
            .iter()
            .filter(|entry| entry.organizer_id == organizer_id)
            .map(|entry| entry.clone())
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        futures::future::ready(Ok(owned)).boxed()
    }

    fn delete_quiz(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let removed = self.quizzes.remove(&id);
        if let Some((_, quiz)) = &removed {
            self.questions.remove(&id);
            self.runtime.remove(&id);
            self.participants.remove(&id);
            self.answers.retain(|(quiz_id, _, _), _| *quiz_id != id);
            self.room_codes
                .remove_if(&quiz.room_code, |_, holder| *holder == id);
        }
        futures::future::ready(Ok(removed.is_some())).boxed()
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let mut list = self.questions.entry(question.quiz_id).or_default();
        match list.iter_mut().find(|entry| entry.id == question.id) {
            Some(existing) => *existing = question,
            None => list.push(question),
        }
        list.sort_by_key(|entry| entry.position);
        drop(list);
        futures::future::ready(Ok(())).boxed()
    }

    fn list_questions(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let questions = self
            .questions
            .get(&quiz_id)
            .map(|list| list.clone())
            .unwrap_or_default();
        futures::future::ready(Ok(questions)).boxed()
    }

    fn find_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let found = self.questions.get(&quiz_id).and_then(|list| {
            list.iter()
                .find(|entry| entry.id == question_id)
                .cloned()
        });
        futures::future::ready(Ok(found)).boxed()
    }

    fn delete_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let mut removed = false;
        if let Some(mut list) = self.questions.get_mut(&quiz_id) {
            let before = list.len();
            list.retain(|entry| entry.id != question_id);
            removed = list.len() != before;
            if removed {
                for (position, entry) in list.iter_mut().enumerate() {
                    entry.position = position;
                }
            }
        }
        futures::future::ready(Ok(removed)).boxed()
    }

    fn upsert_runtime(&self, runtime: RuntimeStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.runtime.insert(runtime.quiz_id, runtime);
        futures::future::ready(Ok(())).boxed()
    }

    fn find_runtime(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RuntimeStateEntity>>> {
        let found = self.runtime.get(&quiz_id).map(|entry| entry.clone());
        futures::future::ready(Ok(found)).boxed()
    }

    fn upsert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<(ParticipantEntity, bool)>> {
        let mut roster = self.participants.entry(participant.quiz_id).or_default();
        let result = match roster.get(&participant.user_id) {
            Some(existing) => (existing.clone(), false),
            None => {
                roster.insert(participant.user_id.clone(), participant.clone());
                (participant, true)
            }
        };
        drop(roster);
        futures::future::ready(Ok(result)).boxed()
    }

    fn list_participants(
        &self,
        quiz_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let roster = self
            .participants
            .get(&quiz_id)
            .map(|list| list.values().cloned().collect())
            .unwrap_or_default();
        futures::future::ready(Ok(roster)).boxed()
    }

    fn increment_participant_score(
        &self,
        quiz_id: Uuid,
        user_id: &str,
        delta: u32,
    ) -> BoxFuture<'static, StorageResult<u32>> {
        let result = match self.participants.get_mut(&quiz_id) {
            Some(mut roster) => match roster.get_mut(user_id) {
                Some(participant) => {
                    participant.score = participant.score.saturating_add(delta);
                    Ok(participant.score)
                }
                None => Err(StorageError::missing_row(format!(
                    "participant `{user_id}` not joined to quiz `{quiz_id}`"
                ))),
            },
            None => Err(StorageError::missing_row(format!(
                "quiz `{quiz_id}` has no roster"
            ))),
        };
        futures::future::ready(result).boxed()
    }

    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let key = (answer.quiz_id, answer.question_id, answer.user_id.clone());
        let inserted = match self.answers.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(answer);
                true
            }
        };
        futures::future::ready(Ok(inserted)).boxed()
    }

    fn list_answers_for_question(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let mut submissions: Vec<AnswerEntity> = self
            .answers
            .iter()
            .filter(|entry| {
                let (quiz, question, _) = entry.key();
                *quiz == quiz_id && *question == question_id
            })
            .map(|entry| entry.value().clone())
            .collect();
        submissions.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        futures::future::ready(Ok(submissions)).boxed()
    }

    fn mark_answer_graded(
        &self,
        quiz_id: Uuid,
        question_id: Uuid,
        user_id: &str,
        is_correct: bool,
        points: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let key = (quiz_id, question_id, user_id.to_string());
        let result = match self.answers.get_mut(&key) {
            Some(mut answer) => {
                if answer.is_graded() {
                    Ok(false)
                } else {
                    answer.is_correct = Some(is_correct);
                    answer.points_earned = Some(points);
                    Ok(true)
                }
            }
            None => Err(StorageError::missing_row(format!(
                "no submission by `{user_id}` for question `{question_id}`"
            ))),
        };
        futures::future::ready(result).boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        futures::future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::dao::models::{QuestionKind, QuizStatus};

    fn quiz(code: &str, status: QuizStatus) -> QuizEntity {
        QuizEntity {
            id: Uuid::new_v4(),
            organizer_id: "org-1".into(),
            title: "Capitals".into(),
            description: None,
            category: None,
            room_code: code.into(),
            status,
            time_limit_secs: 30,
            base_points: 10,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn answer(quiz_id: Uuid, question_id: Uuid, user: &str) -> AnswerEntity {
        AnswerEntity {
            id: Uuid::new_v4(),
            quiz_id,
            question_id,
            user_id: user.into(),
            values: vec!["B".into()],
            is_correct: None,
            points_earned: None,
            submitted_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn room_code_unique_among_non_completed() {
        let store = MemoryStore::new();
        assert!(store.insert_quiz(quiz("ABC234", QuizStatus::Draft)).await.unwrap());
        assert!(!store.insert_quiz(quiz("ABC234", QuizStatus::Draft)).await.unwrap());
    }

    #[tokio::test]
    async fn room_code_reusable_after_completion() {
        let store = MemoryStore::new();
        let mut first = quiz("XYZ789", QuizStatus::Active);
        let first_id = first.id;
        assert!(store.insert_quiz(first.clone()).await.unwrap());

        first.status = QuizStatus::Completed;
        store.update_quiz(first).await.unwrap();

        assert!(store.insert_quiz(quiz("XYZ789", QuizStatus::Draft)).await.unwrap());
        // The code now resolves to the new holder, not the completed quiz.
        let holder = store.find_quiz_by_room_code("XYZ789").await.unwrap().unwrap();
        assert_ne!(holder.id, first_id);
    }

    #[tokio::test]
    async fn answers_are_write_once_per_user_and_question() {
        let store = MemoryStore::new();
        let quiz_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();

        assert!(store.insert_answer(answer(quiz_id, question_id, "u1")).await.unwrap());
        assert!(!store.insert_answer(answer(quiz_id, question_id, "u1")).await.unwrap());
        assert!(store.insert_answer(answer(quiz_id, question_id, "u2")).await.unwrap());

        let stored = store
            .list_answers_for_question(quiz_id, question_id)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn grading_mark_applies_at_most_once() {
        let store = MemoryStore::new();
        let quiz_id = Uuid::new_v4();
        let question_id = Uuid::new_v4();
        store.insert_answer(answer(quiz_id, question_id, "u1")).await.unwrap();

        assert!(
            store
                .mark_answer_graded(quiz_id, question_id, "u1", true, 17)
                .await
                .unwrap()
        );
        assert!(
            !store
                .mark_answer_graded(quiz_id, question_id, "u1", true, 17)
                .await
                .unwrap()
        );

        let stored = store
            .list_answers_for_question(quiz_id, question_id)
            .await
            .unwrap();
        assert_eq!(stored[0].points_earned, Some(17));
    }

    #[tokio::test]
    async fn question_positions_renumbered_on_delete() {
        let store = MemoryStore::new();
        let quiz_id = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (position, id) in ids.iter().enumerate() {
            store
                .save_question(QuestionEntity {
                    id: *id,
                    quiz_id,
                    text: format!("q{position}"),
                    image_url: None,
                    kind: QuestionKind::Text,
                    options: Vec::new(),
                    correct_answers: vec!["x".into()],
                    position,
                })
                .await
                .unwrap();
        }

        assert!(store.delete_question(quiz_id, ids[1]).await.unwrap());
        let remaining = store.list_questions(quiz_id).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].position, 0);
        assert_eq!(remaining[1].position, 1);
        assert_eq!(remaining[1].id, ids[2]);
    }

    #[tokio::test]
    async fn participant_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let quiz_id = Uuid::new_v4();
        let row = ParticipantEntity {
            quiz_id,
            user_id: "u1".into(),
            display_name: "Alice".into(),
            score: 0,
            joined_at: OffsetDateTime::now_utc(),
        };

        let (_, created) = store.upsert_participant(row.clone()).await.unwrap();
        assert!(created);
        let (stored, created) = store.upsert_participant(row).await.unwrap();
        assert!(!created);
        assert_eq!(stored.display_name, "Alice");
        assert_eq!(store.list_participants(quiz_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn score_increment_accumulates() {
        let store = MemoryStore::new();
        let quiz_id = Uuid::new_v4();
        store
            .upsert_participant(ParticipantEntity {
                quiz_id,
                user_id: "u1".into(),
                display_name: "Alice".into(),
                score: 0,
                joined_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();

        assert_eq!(
            store.increment_participant_score(quiz_id, "u1", 17).await.unwrap(),
            17
        );
        assert_eq!(
            store.increment_participant_score(quiz_id, "u1", 10).await.unwrap(),
            27
        );
    }
}
