use std::sync::Arc;

use chrono::Utc;

use quiz_core::Clock;
use quiz_core::model::{Question, QuestionId, ResponseStats};
use quiz_storage::repository::{ResponseRecord, Storage};

use crate::error::{AppServicesError, SessionError, StatsError};
use crate::ingest::IngestService;
use crate::session::{ALL_SUBJECTS, SessionService, shuffle_pool};
use crate::stats::StatsService;

/// Assembles the services over one storage backend and exposes the
/// contract the presentation layer consumes: a randomized question
/// set, answer submission, and per-question stats.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    sessions: Arc<SessionService>,
    stats: Arc<StatsService>,
    ingest: Arc<IngestService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(storage, clock))
    }

    /// Build services over an existing storage aggregate (in-memory in
    /// tests).
    #[must_use]
    pub fn with_storage(storage: Storage, clock: Clock) -> Self {
        let sessions = Arc::new(SessionService::from_storage(clock, &storage));
        let stats = Arc::new(StatsService::from_storage(&storage));
        let ingest = Arc::new(IngestService::from_storage(&storage));
        Self {
            clock,
            storage,
            sessions,
            stats,
            ingest,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn ingest(&self) -> Arc<IngestService> {
        Arc::clone(&self.ingest)
    }

    /// Serve-set endpoint: the canonical questions for a subject
    /// (`"All"` bypasses filtering), uniformly shuffled per request.
    ///
    /// An empty result is valid here; whether to treat it as an error
    /// is the caller's call (`SessionService::start` does).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the pool cannot be read.
    pub async fn question_set(&self, subject: &str) -> Result<Vec<Question>, SessionError> {
        let filter = (subject != ALL_SUBJECTS).then_some(subject);
        let mut pool = self.storage.questions.list_questions(filter).await?;
        shuffle_pool(&mut pool);
        Ok(pool)
    }

    /// Submit-answer endpoint: appends one response event and returns
    /// the stored record as acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the response cannot be
    /// stored.
    pub async fn submit_answer(
        &self,
        question_id: QuestionId,
        selected_label: impl Into<String>,
        is_correct: bool,
        time_seconds: u32,
    ) -> Result<ResponseRecord, SessionError> {
        let record = ResponseRecord {
            id: None,
            question_id,
            selected_label: selected_label.into(),
            is_correct,
            time_seconds,
            created_at: self.now(),
        };
        Ok(self.storage.responses.append_response(record).await?)
    }

    /// Stats endpoint: the three aggregate fields for one question.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the response log cannot be
    /// read.
    pub async fn question_stats(
        &self,
        question_id: &QuestionId,
    ) -> Result<ResponseStats, StatsError> {
        self.stats.for_question(question_id).await
    }

    /// Distinct subjects present in the pool, in pool order — feeds
    /// the presentation layer's filter dropdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the pool cannot be read.
    pub async fn subjects(&self) -> Result<Vec<String>, SessionError> {
        let pool = self.storage.questions.list_questions(None).await?;
        let mut subjects: Vec<String> = Vec::new();
        for question in pool {
            if !subjects.contains(&question.subject) {
                subjects.push(question.subject);
            }
        }
        Ok(subjects)
    }

    fn now(&self) -> chrono::DateTime<Utc> {
        self.clock.now()
    }
}
