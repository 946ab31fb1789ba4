//! Quiz session orchestration.
//!
//! The state machine itself lives in `quiz_core::model::SessionState`
//! and is pure; this service owns the storage round-trips around it:
//! fetching and shuffling the question set, persisting the response a
//! reveal produces, and reading back the question's aggregate stats.

use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::Clock;
use quiz_core::model::{Question, ResponseStats, RevealOutcome, SessionState};
use quiz_storage::repository::{QuestionRepository, ResponseRecord, ResponseRepository, Storage};

use crate::error::SessionError;

/// Filter value meaning "serve every subject".
pub const ALL_SUBJECTS: &str = "All";

/// Everything the presentation layer shows after a reveal: the stored
/// response (write acknowledgment), the reveal outcome, and the
/// question's all-time stats including this answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealFeedback {
    pub outcome: RevealOutcome,
    pub response: ResponseRecord,
    pub stats: ResponseStats,
}

/// Serves question sets and drives one sitting's state machine against
/// the store.
#[derive(Clone)]
pub struct SessionService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl SessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            responses,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.responses),
        )
    }

    /// Starts a sitting over the questions matching `subject`
    /// ([`ALL_SUBJECTS`] bypasses filtering), uniformly shuffled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions match, or
    /// `SessionError::Storage` if the pool cannot be read.
    pub async fn start(&self, subject: &str) -> Result<SessionState, SessionError> {
        let filter = (subject != ALL_SUBJECTS).then_some(subject);
        let mut pool = self.questions.list_questions(filter).await?;
        shuffle_pool(&mut pool);
        SessionState::new(pool, self.clock.now()).map_err(|_| SessionError::Empty)
    }

    /// Records a tentative selection. Pure state, nothing persisted.
    pub fn select(&self, session: &mut SessionState, label: &str) {
        session.select(label);
    }

    /// Reveals the current question, persists the response, and reads
    /// the question's stats.
    ///
    /// The stats read is issued only after `append_response` has
    /// returned the stored row, so the respondent's own answer is
    /// always reflected in the stats they see.
    ///
    /// The local transition is applied before any store call: when the
    /// write or the read fails, the question stays revealed and the
    /// sitting remains advanceable — the response is simply missing
    /// from future aggregates.
    ///
    /// Returns `Ok(None)` if nothing is selected or the question was
    /// already revealed; a repeated reveal never double-writes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on a store failure, after the
    /// local reveal has taken effect.
    pub async fn reveal(
        &self,
        session: &mut SessionState,
    ) -> Result<Option<RevealFeedback>, SessionError> {
        let Some(outcome) = session.reveal(self.clock.now()) else {
            return Ok(None);
        };

        let response = self
            .responses
            .append_response(ResponseRecord {
                id: None,
                question_id: outcome.question_id.clone(),
                selected_label: outcome.selected_label.clone(),
                is_correct: outcome.is_correct,
                time_seconds: outcome.time_seconds,
                created_at: self.clock.now(),
            })
            .await?;

        let all = self
            .responses
            .responses_for_question(&outcome.question_id)
            .await?;
        let stats = ResponseStats::from_responses(&all);

        Ok(Some(RevealFeedback {
            outcome,
            response,
            stats,
        }))
    }

    /// Advances the sitting; completion recycles it from the start.
    pub fn advance(&self, session: &mut SessionState) -> quiz_core::model::Advance {
        session.advance(self.clock.now())
    }

    /// Current `mm:ss` display value for the sitting clock.
    #[must_use]
    pub fn elapsed(&self, session: &SessionState) -> String {
        session.elapsed(self.clock.now())
    }
}

/// Uniform shuffle of the served question set (Fisher–Yates via
/// `SliceRandom`): every permutation equally likely, source order
/// carries no meaning afterward.
pub(crate) fn shuffle_pool(pool: &mut [Question]) {
    pool.shuffle(&mut rng());
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::{Advance, Alternatives, QuestionDraft, QuestionId, Response};
    use quiz_core::time::fixed_clock;
    use quiz_storage::repository::{InMemoryRepository, QuestionRepository, StorageError};
    use std::collections::HashMap;

    fn build_question(id: &str, subject: &str) -> Question {
        QuestionDraft {
            id: Some(QuestionId::new(id)),
            subject: Some(subject.to_owned()),
            stem: Some(format!("stem {id}")),
            alternatives: Some(Alternatives::from_pairs([("a", "right"), ("b", "wrong")])),
            correct_label: Some("a".into()),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap()
    }

    async fn service_with_pool(subjects: &[(&str, &str)]) -> (SessionService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        for (id, subject) in subjects {
            repo.insert_question(&build_question(id, subject))
                .await
                .unwrap();
        }
        let service = SessionService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (service, repo)
    }

    #[tokio::test]
    async fn start_filters_by_subject() {
        let (service, _repo) =
            service_with_pool(&[("q1", "Physics"), ("q2", "MCA"), ("q3", "Physics")]).await;

        let session = service.start("Physics").await.unwrap();
        assert_eq!(session.total_questions(), 2);

        let session = service.start(ALL_SUBJECTS).await.unwrap();
        assert_eq!(session.total_questions(), 3);

        let err = service.start("Sensing").await.unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[tokio::test]
    async fn reveal_persists_once_and_reads_back_own_answer() {
        let (service, repo) = service_with_pool(&[("q1", "Physics")]).await;
        let mut session = service.start(ALL_SUBJECTS).await.unwrap();

        service.select(&mut session, "a");
        let feedback = service.reveal(&mut session).await.unwrap().unwrap();
        assert!(feedback.outcome.is_correct);
        assert!(feedback.response.id.is_some());
        // Own answer reflected immediately.
        assert_eq!(feedback.stats.total_responses, 1);
        assert_eq!(feedback.stats.accuracy_rate, 100);

        // Second reveal: no-op, no second write.
        let again = service.reveal(&mut session).await.unwrap();
        assert!(again.is_none());
        let stored = repo
            .responses_for_question(&QuestionId::new("q1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn sitting_recycles_after_the_last_question() {
        let (service, _repo) = service_with_pool(&[("q1", "Physics"), ("q2", "Physics")]).await;
        let mut session = service.start(ALL_SUBJECTS).await.unwrap();

        for expected in [Advance::Next, Advance::Completed { final_score: 10.0 }] {
            let label = session.current_question().correct_label.clone();
            service.select(&mut session, &label);
            service.reveal(&mut session).await.unwrap().unwrap();
            let advance = service.advance(&mut session);
            match (advance, expected) {
                (Advance::Next, Advance::Next) => {}
                (
                    Advance::Completed { final_score },
                    Advance::Completed { final_score: want },
                ) => {
                    assert!((final_score - want).abs() < 1e-9);
                }
                (got, want) => panic!("expected {want:?}, got {got:?}"),
            }
        }

        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0.0);
    }

    struct FailingResponses;

    #[async_trait]
    impl ResponseRepository for FailingResponses {
        async fn append_response(
            &self,
            _record: ResponseRecord,
        ) -> Result<ResponseRecord, StorageError> {
            Err(StorageError::Connection("store down".into()))
        }

        async fn responses_for_question(
            &self,
            _question_id: &QuestionId,
        ) -> Result<Vec<Response>, StorageError> {
            Err(StorageError::Connection("store down".into()))
        }

        async fn delete_all_responses(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_session_revealed_and_advanceable() {
        let repo = InMemoryRepository::new();
        repo.insert_question(&build_question("q1", "Physics"))
            .await
            .unwrap();
        repo.insert_question(&build_question("q2", "Physics"))
            .await
            .unwrap();
        let service = SessionService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(FailingResponses),
        );

        let mut session = service.start(ALL_SUBJECTS).await.unwrap();
        service.select(&mut session, "a");

        let err = service.reveal(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));

        // Local state took the transition despite the failed write.
        assert!(session.is_revealed());
        assert!(session.score() > 0.0);
        assert_eq!(service.advance(&mut session), Advance::Next);
    }

    #[test]
    fn shuffle_first_position_converges_to_uniform() {
        let base: Vec<Question> = (0..4)
            .map(|i| build_question(&format!("q{i}"), "Physics"))
            .collect();

        let runs = 4000;
        let mut first_counts: HashMap<QuestionId, u32> = HashMap::new();
        for _ in 0..runs {
            let mut pool = base.clone();
            shuffle_pool(&mut pool);
            *first_counts.entry(pool[0].id.clone()).or_default() += 1;
        }

        // Expected share is 25%; allow a generous band so the test is
        // stable while still catching a biased shuffle.
        assert_eq!(first_counts.len(), 4);
        for count in first_counts.values() {
            let share = f64::from(*count) / f64::from(runs);
            assert!(
                (0.17..0.33).contains(&share),
                "first-position share {share} outside uniform band"
            );
        }
    }
}
