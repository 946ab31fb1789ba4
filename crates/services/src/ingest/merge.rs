//! Deduplication of normalized question batches.
//!
//! Batches are merged in source order into an insertion-ordered map
//! keyed by fingerprint. The map keeps the position of the first
//! occurrence but the value of the last, so later sources (assumed to
//! carry corrections) win on content while the pool's order stays
//! stable. That asymmetry is observable behavior and pinned by tests.

use indexmap::IndexMap;

use quiz_core::model::Question;

/// Number of stem characters mixed into the dedup fingerprint.
const STEM_PREFIX_CHARS: usize = 20;

/// Derives the dedup key for a question: its id concatenated with the
/// first [`STEM_PREFIX_CHARS`] characters of its stem.
#[must_use]
pub fn fingerprint(question: &Question) -> String {
    let mut key = question.id.to_string();
    key.extend(question.stem.chars().take(STEM_PREFIX_CHARS));
    key
}

/// Flattens per-source batches into one deduplicated pool.
///
/// Output order is the first-occurrence order of each surviving
/// fingerprint; output content is the last-seen record per
/// fingerprint.
#[must_use]
pub fn merge_batches<I>(batches: I) -> Vec<Question>
where
    I: IntoIterator<Item = Vec<Question>>,
{
    let mut pool: IndexMap<String, Question> = IndexMap::new();
    for batch in batches {
        for question in batch {
            pool.insert(fingerprint(&question), question);
        }
    }
    pool.into_values().collect()
}
