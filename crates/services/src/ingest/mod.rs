//! Offline ingestion: raw JSON sources in, canonical pool out.
//!
//! Runs as a one-shot batch (the `ingest` binary), never concurrently
//! with live session traffic. The pool is rebuilt wholesale:
//! responses and questions are cleared, then the normalized and
//! deduplicated pool is written back.

mod merge;
mod normalize;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use quiz_core::model::{DEFAULT_SUBJECT, Question};
use quiz_storage::repository::{QuestionRepository, ResponseRepository, Storage};

use crate::error::IngestError;

pub use merge::{fingerprint, merge_batches};
pub use normalize::{NormalizeError, normalize_record};

/// Subject inferred from a source's name when its records carry none.
const SUBJECT_KEYWORDS: &[(&str, &str)] = &[
    ("physics", "Physics"),
    ("mca", "MCA"),
    ("sensing", "Sensing"),
    ("intelligence", "Intelligence"),
];

/// One named raw source: an array of loosely-typed question records.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub name: String,
    pub records: Vec<Value>,
}

impl RawSource {
    #[must_use]
    pub fn new(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// Infers a subject from keyword substrings of a source name.
#[must_use]
pub fn subject_for_source(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    SUBJECT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map_or(DEFAULT_SUBJECT, |(_, subject)| subject)
}

/// Loads every `*.json` file in `dir` as a raw source, in file-name
/// order so merge precedence is reproducible.
///
/// A file that disappears between listing and reading is skipped
/// silently; a file that fails to parse as a JSON array is logged and
/// skipped. Neither aborts the batch.
///
/// # Errors
///
/// Returns `IngestError::Io` only if the directory itself cannot be
/// listed.
pub fn load_sources(dir: &Path) -> Result<Vec<RawSource>, IngestError> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Ok(bytes) = fs::read(&path) else {
            continue;
        };

        match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(records) => {
                debug!(source = %name, records = records.len(), "loaded source");
                sources.push(RawSource::new(name, records));
            }
            Err(err) => {
                warn!(source = %name, error = %err, "skipping unparsable source");
            }
        }
    }
    Ok(sources)
}

/// Counts reported by a pool rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: usize,
    /// Questions written to the pool after dedup.
    pub loaded: usize,
    /// Raw records dropped as malformed.
    pub dropped: usize,
}

/// Rebuilds the question pool from raw sources.
#[derive(Clone)]
pub struct IngestService {
    questions: Arc<dyn QuestionRepository>,
    responses: Arc<dyn ResponseRepository>,
}

impl IngestService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        Self {
            questions,
            responses,
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.questions), Arc::clone(&storage.responses))
    }

    /// Normalizes each source against its inferred subject, dropping
    /// malformed records with a warning.
    #[must_use]
    pub fn normalize_sources(sources: &[RawSource]) -> (Vec<Vec<Question>>, usize) {
        let mut batches = Vec::with_capacity(sources.len());
        let mut dropped = 0;

        for source in sources {
            let default_subject = subject_for_source(&source.name);
            let mut batch = Vec::with_capacity(source.records.len());
            for record in &source.records {
                match normalize_record(record, default_subject) {
                    Ok(question) => batch.push(question),
                    Err(err) => {
                        dropped += 1;
                        warn!(source = %source.name, error = %err, "dropping malformed record");
                    }
                }
            }
            debug!(
                source = %source.name,
                subject = default_subject,
                normalized = batch.len(),
                "normalized source"
            );
            batches.push(batch);
        }

        (batches, dropped)
    }

    /// Clears the store and reloads it with the merged pool.
    ///
    /// Clearing and reloading is not atomic; a reader racing the batch
    /// can observe an empty or partial pool. Acceptable for an offline
    /// maintenance job.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Storage` if the clear or any insert fails.
    pub async fn rebuild_pool(&self, sources: &[RawSource]) -> Result<IngestReport, IngestError> {
        let (batches, dropped) = Self::normalize_sources(sources);
        let pool = merge_batches(batches);

        self.responses.delete_all_responses().await?;
        self.questions.delete_all_questions().await?;
        for question in &pool {
            self.questions.insert_question(question).await?;
        }

        Ok(IngestReport {
            sources: sources.len(),
            loaded: pool.len(),
            dropped,
        })
    }
}
