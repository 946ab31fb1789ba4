use quiz_core::model::{QuestionId, Response};

use super::{SqliteRepository, mapping::map_response_row_into_response};
use crate::repository::{ResponseRecord, ResponseRepository, StorageError};

#[async_trait::async_trait]
impl ResponseRepository for SqliteRepository {
    async fn append_response(
        &self,
        mut record: ResponseRecord,
    ) -> Result<ResponseRecord, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO responses (
                    question_id, selected_label, is_correct, time_seconds, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.question_id.as_str())
        .bind(&record.selected_label)
        .bind(record.is_correct)
        .bind(i64::from(record.time_seconds))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        record.id = Some(res.last_insert_rowid());
        Ok(record)
    }

    async fn responses_for_question(
        &self,
        question_id: &QuestionId,
    ) -> Result<Vec<Response>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, question_id, selected_label, is_correct, time_seconds, created_at
                FROM responses
                WHERE question_id = ?1
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(question_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut responses = Vec::with_capacity(rows.len());
        for row in rows {
            responses.push(map_response_row_into_response(&row)?);
        }
        Ok(responses)
    }

    async fn delete_all_responses(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM responses")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
