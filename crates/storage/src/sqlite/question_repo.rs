use quiz_core::model::Question;
use tracing::warn;

use super::{SqliteRepository, mapping::map_question_row};
use crate::repository::{QuestionRecord, QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn list_questions(&self, subject: Option<&str>) -> Result<Vec<Question>, StorageError> {
        let base = r"
            SELECT
                id, kind, subject, stem, sub_items, directive,
                alternatives, correct_label, rationale
            FROM questions
        ";

        let rows = match subject {
            Some(subject) => {
                sqlx::query(&format!("{base} WHERE subject = ?1"))
                    .bind(subject)
                    .fetch_all(&self.pool)
                    .await
            }
            None => sqlx::query(base).fetch_all(&self.pool).await,
        }
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            match map_question_row(&row) {
                Ok(question) => questions.push(question),
                // A single undecodable row is excluded; the rest of
                // the batch is still served.
                Err(err) => warn!(error = %err, "skipping undecodable question row"),
            }
        }
        Ok(questions)
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StorageError> {
        let record = QuestionRecord::from_question(question)?;

        sqlx::query(
            r"
            INSERT INTO questions (
                id, kind, subject, stem, sub_items, directive,
                alternatives, correct_label, rationale
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                subject = excluded.subject,
                stem = excluded.stem,
                sub_items = excluded.sub_items,
                directive = excluded.directive,
                alternatives = excluded.alternatives,
                correct_label = excluded.correct_label,
                rationale = excluded.rationale
            ",
        )
        .bind(record.id)
        .bind(record.kind)
        .bind(record.subject)
        .bind(record.stem)
        .bind(record.sub_items)
        .bind(record.directive)
        .bind(record.alternatives)
        .bind(record.correct_label)
        .bind(record.rationale)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn delete_all_questions(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM questions")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
