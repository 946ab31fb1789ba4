use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Question, QuestionDraft, QuestionId, QuestionKind, Response};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PERSISTED SHAPES ──────────────────────────────────────────────────────────
//

/// Persisted shape for a question.
///
/// `alternatives` and `sub_items` are stored as JSON text blobs and
/// decoded back into structured form on read, so repositories can
/// serialize without leaking storage concerns into the domain layer.
#[derive(Debug, Clone)]
pub struct QuestionRecord {
    pub id: String,
    pub kind: String,
    pub subject: String,
    pub stem: String,
    pub sub_items: Option<String>,
    pub directive: Option<String>,
    pub alternatives: String,
    pub correct_label: String,
    pub rationale: String,
}

impl QuestionRecord {
    /// Encode a domain question for storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a JSON blob cannot be
    /// encoded.
    pub fn from_question(question: &Question) -> Result<Self, StorageError> {
        let alternatives = serde_json::to_string(&question.alternatives)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let sub_items = question
            .sub_items
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Self {
            id: question.id.to_string(),
            kind: question.kind.as_str().to_owned(),
            subject: question.subject.clone(),
            stem: question.stem.clone(),
            sub_items,
            directive: question.directive.clone(),
            alternatives,
            correct_label: question.correct_label.clone(),
            rationale: question.rationale.clone(),
        })
    }

    /// Decode the record back into a domain `Question`.
    ///
    /// Runs the blobs through draft validation so a row that lost its
    /// invariant (bad blob, stale correct label) is rejected here and
    /// can be skipped by the caller instead of poisoning the batch.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` on blob decode or
    /// validation failure.
    pub fn into_question(self) -> Result<Question, StorageError> {
        let alternatives = serde_json::from_str(&self.alternatives)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let sub_items = self
            .sub_items
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        QuestionDraft {
            id: Some(QuestionId::new(self.id)),
            kind: Some(parse_kind(&self.kind)?),
            subject: Some(self.subject),
            stem: Some(self.stem),
            sub_items,
            directive: self.directive,
            alternatives: Some(alternatives),
            correct_label: Some(self.correct_label),
            rationale: Some(self.rationale),
        }
        .validate()
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

fn parse_kind(s: &str) -> Result<QuestionKind, StorageError> {
    match s {
        "type-1" => Ok(QuestionKind::Type1),
        "type-2" => Ok(QuestionKind::Type2),
        "type-3" => Ok(QuestionKind::Type3),
        "type-4" => Ok(QuestionKind::Type4),
        _ => Err(StorageError::Serialization(format!("invalid kind: {s}"))),
    }
}

/// Persisted shape for a response event.
///
/// `id` is `None` until the row is stored; `append_response` returns
/// the record with its assigned id as the write acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub id: Option<i64>,
    pub question_id: QuestionId,
    pub selected_label: String,
    pub is_correct: bool,
    pub time_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl ResponseRecord {
    #[must_use]
    pub fn from_response(response: &Response) -> Self {
        Self {
            id: None,
            question_id: response.question_id.clone(),
            selected_label: response.selected_label.clone(),
            is_correct: response.is_correct,
            time_seconds: response.time_seconds,
            created_at: response.created_at,
        }
    }

    #[must_use]
    pub fn into_response(self) -> Response {
        Response {
            question_id: self.question_id,
            selected_label: self.selected_label,
            is_correct: self.is_correct,
            time_seconds: self.time_seconds,
            created_at: self.created_at,
        }
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for the question pool.
///
/// Questions are immutable once ingested; the only write paths are
/// bulk insert and bulk clear, both used by the offline re-ingestion
/// job.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch questions, optionally filtered by subject (`None` means
    /// no filter). Rows that fail to decode are excluded, not fatal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch itself cannot be read.
    async fn list_questions(&self, subject: Option<&str>) -> Result<Vec<Question>, StorageError>;

    /// Persist one canonical question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Remove every question from the pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn delete_all_questions(&self) -> Result<(), StorageError>;
}

/// Repository contract for the append-only response log.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Append one response event and return the stored record.
    ///
    /// The returned record is the durability acknowledgment: a stats
    /// read issued after this call returns must observe the write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the response cannot be stored.
    async fn append_response(&self, record: ResponseRecord)
    -> Result<ResponseRecord, StorageError>;

    /// Fetch all responses ever recorded for a question, oldest first.
    ///
    /// Responses whose question has since been deleted are still
    /// returned; the reference is weak by design.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn responses_for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Response>, StorageError>;

    /// Remove every recorded response (re-ingestion tooling only).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn delete_all_responses(&self) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory backend for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    responses: Arc<Mutex<Vec<ResponseRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(&self, subject: Option<&str>) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|q| subject.is_none_or(|s| q.subject == s))
            .cloned()
            .collect())
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(question.clone());
        Ok(())
    }

    async fn delete_all_questions(&self) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

#[async_trait]
impl ResponseRepository for InMemoryRepository {
    async fn append_response(
        &self,
        mut record: ResponseRecord,
    ) -> Result<ResponseRecord, StorageError> {
        let mut guard = self
            .responses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        record.id = Some(guard.len() as i64 + 1);
        guard.push(record.clone());
        Ok(record)
    }

    async fn responses_for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Response>, StorageError> {
        let guard = self
            .responses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|r| &r.question_id == question_id)
            .cloned()
            .map(ResponseRecord::into_response)
            .collect())
    }

    async fn delete_all_responses(&self) -> Result<(), StorageError> {
        let mut guard = self
            .responses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// Aggregates the question and response repositories behind trait
/// objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub responses: Arc<dyn ResponseRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let responses: Arc<dyn ResponseRepository> = Arc::new(repo);
        Self {
            questions,
            responses,
        }
    }
}
