//! End-to-end flow over in-memory storage: ingest heterogeneous
//! source batches, run a full sitting, and read back per-question
//! stats.

use serde_json::json;

use quiz_core::model::{Advance, QuestionId};
use quiz_core::time::fixed_clock;
use quiz_services::{ALL_SUBJECTS, AppServices, IngestService, RawSource, SessionService};
use quiz_storage::repository::Storage;

#[tokio::test]
async fn legacy_portuguese_records_ingest_into_canonical_questions() {
    let storage = Storage::in_memory();
    let ingest = IngestService::from_storage(&storage);

    let sources = [RawSource::new(
        "legacy_batch.json",
        vec![json!({
            "id": "q1",
            "tema": "Física",
            "enunciado": "Qual é a unidade de força no SI?",
            "opcoes": { "a": "newton", "b": "joule" },
            "correta": "a"
        })],
    )];

    let report = ingest.rebuild_pool(&sources).await.unwrap();
    assert_eq!(report.sources, 1);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.dropped, 0);

    let pool = storage.questions.list_questions(None).await.unwrap();
    assert_eq!(pool.len(), 1);
    let question = &pool[0];
    assert_eq!(question.id, QuestionId::new("q1"));
    assert_eq!(question.subject, "Física");
    assert_eq!(question.stem, "Qual é a unidade de força no SI?");
    assert_eq!(question.correct_label, "a");
    assert_eq!(
        question.alternatives.iter().collect::<Vec<_>>(),
        vec![("a", "newton"), ("b", "joule")]
    );
}

#[tokio::test]
async fn later_source_wins_content_but_keeps_first_seen_order() {
    let storage = Storage::in_memory();
    let ingest = IngestService::from_storage(&storage);

    let stem = "Which layer of the atmosphere contains the ozone layer?";
    let sources = [
        RawSource::new(
            "physics_batch_1.json",
            vec![
                json!({
                    "id": "dup",
                    "stem": stem,
                    "alternatives": { "a": "stale", "b": "text" },
                    "correctLabel": "a"
                }),
                json!({
                    "id": "other",
                    "stem": "An unrelated question?",
                    "alternatives": { "a": "x", "b": "y" },
                    "correctLabel": "b"
                }),
            ],
        ),
        RawSource::new(
            "physics_batch_2.json",
            vec![json!({
                "id": "dup",
                "stem": stem,
                "alternatives": { "a": "fresh", "b": "text" },
                "correctLabel": "b"
            })],
        ),
    ];

    let report = ingest.rebuild_pool(&sources).await.unwrap();
    assert_eq!(report.loaded, 2);

    let pool = storage.questions.list_questions(None).await.unwrap();
    // The duplicate keeps its first-seen slot ahead of "other"...
    assert_eq!(pool[0].id, QuestionId::new("dup"));
    assert_eq!(pool[1].id, QuestionId::new("other"));
    // ...while carrying the last-seen content.
    assert_eq!(pool[0].alternatives.get("a"), Some("fresh"));
    assert_eq!(pool[0].correct_label, "b");
}

#[tokio::test]
async fn full_sitting_scores_ten_and_feeds_stats() {
    let storage = Storage::in_memory();
    let ingest = IngestService::from_storage(&storage);

    let records = (0..4)
        .map(|i| {
            json!({
                "id": format!("q{i}"),
                "stem": format!("Question number {i}?"),
                "alternatives": { "a": "right", "b": "wrong" },
                "correctLabel": "a"
            })
        })
        .collect();
    let sources = [RawSource::new("physics_set.json", records)];
    ingest.rebuild_pool(&sources).await.unwrap();

    let service = SessionService::from_storage(fixed_clock(), &storage);
    let mut session = service.start("Physics").await.unwrap();
    assert_eq!(session.total_questions(), 4);

    let mut last_feedback = None;
    loop {
        service.select(&mut session, "a");
        let feedback = service.reveal(&mut session).await.unwrap().unwrap();
        assert!(feedback.outcome.is_correct);
        last_feedback = Some(feedback);
        match service.advance(&mut session) {
            Advance::Next => {}
            Advance::Completed { final_score } => {
                assert!((final_score - 10.0).abs() < 1e-9);
                break;
            }
        }
    }

    // Completion recycled the sitting.
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.score(), 0.0);
    assert!(!session.is_revealed());

    // Every reveal reached the store; check one question's aggregate.
    let feedback = last_feedback.unwrap();
    assert_eq!(feedback.stats.total_responses, 1);
    assert_eq!(feedback.stats.accuracy_rate, 100);

    let app = AppServices::with_storage(storage, fixed_clock());
    let answered = app
        .question_stats(&feedback.outcome.question_id)
        .await
        .unwrap();
    assert_eq!(answered.total_responses, 1);
    assert_eq!(answered.accuracy_rate, 100);
}

#[tokio::test]
async fn rebuild_clears_stale_pool_and_responses() {
    let storage = Storage::in_memory();
    let ingest = IngestService::from_storage(&storage);
    let app = AppServices::with_storage(storage.clone(), fixed_clock());

    let first = [RawSource::new(
        "mca_old.json",
        vec![json!({
            "id": "old",
            "stem": "A question about to be replaced?",
            "alternatives": { "a": "x", "b": "y" },
            "correctLabel": "a"
        })],
    )];
    ingest.rebuild_pool(&first).await.unwrap();
    app.submit_answer(QuestionId::new("old"), "a", true, 5)
        .await
        .unwrap();

    let second = [RawSource::new(
        "mca_new.json",
        vec![json!({
            "id": "new",
            "stem": "The replacement question?",
            "alternatives": { "a": "x", "b": "y" },
            "correctLabel": "b"
        })],
    )];
    ingest.rebuild_pool(&second).await.unwrap();

    let pool = app.question_set(ALL_SUBJECTS).await.unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].id, QuestionId::new("new"));

    // Responses to the removed question were cleared with the pool.
    let stats = app.question_stats(&QuestionId::new("old")).await.unwrap();
    assert_eq!(stats.total_responses, 0);
}
