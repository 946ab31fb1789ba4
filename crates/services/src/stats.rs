use std::sync::Arc;

use quiz_core::model::{QuestionId, ResponseStats};
use quiz_storage::repository::{ResponseRepository, Storage};

use crate::error::StatsError;

/// Summarizes the recorded responses for a question.
#[derive(Clone)]
pub struct StatsService {
    responses: Arc<dyn ResponseRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(responses: Arc<dyn ResponseRepository>) -> Self {
        Self { responses }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.responses))
    }

    /// All-time aggregate for one question id.
    ///
    /// A question with no responses (or an id no question carries
    /// anymore) yields the zero aggregate; only a store failure is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the response log cannot be
    /// read.
    pub async fn for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<ResponseStats, StatsError> {
        let responses = self.responses.responses_for_question(question_id).await?;
        Ok(ResponseStats::from_responses(&responses))
    }
}
