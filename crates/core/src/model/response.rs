use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

//
// ─── RESPONSE ─────────────────────────────────────────────────────────────────
//

/// Record of a single answered question.
///
/// Responses are append-only events: written once at reveal time,
/// never updated. The `question_id` is a weak reference; the question
/// may be deleted later (full pool re-ingestion) and the orphaned
/// responses simply stop being aggregated for anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub question_id: QuestionId,
    pub selected_label: String,
    pub is_correct: bool,
    pub time_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl Response {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        selected_label: impl Into<String>,
        is_correct: bool,
        time_seconds: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            selected_label: selected_label.into(),
            is_correct,
            time_seconds,
            created_at,
        }
    }
}

//
// ─── RESPONSE STATS ───────────────────────────────────────────────────────────
//

/// All-time aggregate over the responses recorded for one question.
///
/// An empty response set is a valid result (all zeroes), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseStats {
    /// Share of correct responses, 0–100, rounded half up.
    pub accuracy_rate: u8,
    /// Mean response time in whole seconds, rounded half up.
    pub average_time_seconds: u32,
    pub total_responses: u32,
}

impl ResponseStats {
    /// Aggregates a set of responses for one question.
    ///
    /// Integer rounding is half-up in both fields, consistent with
    /// ordinary decimal rounding.
    #[must_use]
    pub fn from_responses(responses: &[Response]) -> Self {
        let total = responses.len() as u64;
        if total == 0 {
            return Self::default();
        }

        let correct = responses.iter().filter(|r| r.is_correct).count() as u64;
        let time_sum: u64 = responses.iter().map(|r| u64::from(r.time_seconds)).sum();

        // round(x / total) as (2x + total) / (2 * total) in integers.
        let accuracy = (correct * 200 + total) / (2 * total);
        let average = (time_sum * 2 + total) / (2 * total);

        Self {
            accuracy_rate: u8::try_from(accuracy).unwrap_or(100),
            average_time_seconds: u32::try_from(average).unwrap_or(u32::MAX),
            total_responses: u32::try_from(total).unwrap_or(u32::MAX),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn response(is_correct: bool, time_seconds: u32) -> Response {
        Response::new(
            QuestionId::new("q1"),
            "a",
            is_correct,
            time_seconds,
            fixed_now(),
        )
    }

    #[test]
    fn empty_set_aggregates_to_zeroes() {
        let stats = ResponseStats::from_responses(&[]);
        assert_eq!(stats, ResponseStats::default());
        assert_eq!(stats.accuracy_rate, 0);
        assert_eq!(stats.average_time_seconds, 0);
        assert_eq!(stats.total_responses, 0);
    }

    #[test]
    fn aggregates_accuracy_and_average_time() {
        let stats = ResponseStats::from_responses(&[response(true, 10), response(false, 20)]);
        assert_eq!(stats.accuracy_rate, 50);
        assert_eq!(stats.average_time_seconds, 15);
        assert_eq!(stats.total_responses, 2);
    }

    #[test]
    fn rounding_is_half_up() {
        // 1 of 8 correct = 12.5% -> 13; mean of 15 and 16 = 15.5 -> 16.
        let mut responses = vec![response(true, 15), response(false, 16)];
        assert_eq!(ResponseStats::from_responses(&responses).average_time_seconds, 16);

        responses = (0..8).map(|i| response(i == 0, 10)).collect();
        assert_eq!(ResponseStats::from_responses(&responses).accuracy_rate, 13);
    }

    #[test]
    fn two_thirds_rounds_to_67() {
        let responses = vec![response(true, 1), response(true, 1), response(false, 1)];
        assert_eq!(ResponseStats::from_responses(&responses).accuracy_rate, 67);
    }
}
