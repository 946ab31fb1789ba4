use quiz_core::model::{Question, QuestionId, Response};
use sqlx::Row;

use crate::repository::{QuestionRecord, ResponseRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let record = QuestionRecord {
        id: row.try_get("id").map_err(ser)?,
        kind: row.try_get("kind").map_err(ser)?,
        subject: row.try_get("subject").map_err(ser)?,
        stem: row.try_get("stem").map_err(ser)?,
        sub_items: row.try_get("sub_items").map_err(ser)?,
        directive: row.try_get("directive").map_err(ser)?,
        alternatives: row.try_get("alternatives").map_err(ser)?,
        correct_label: row.try_get("correct_label").map_err(ser)?,
        rationale: row.try_get("rationale").map_err(ser)?,
    };
    record.into_question()
}

pub(crate) fn map_response_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ResponseRecord, StorageError> {
    let time_seconds_i64: i64 = row.try_get("time_seconds").map_err(ser)?;
    let time_seconds = u32::try_from(time_seconds_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid time: {time_seconds_i64}")))?;

    Ok(ResponseRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        selected_label: row.try_get("selected_label").map_err(ser)?,
        is_correct: row.try_get("is_correct").map_err(ser)?,
        time_seconds,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_response_row_into_response(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Response, StorageError> {
    Ok(map_response_row(row)?.into_response())
}
