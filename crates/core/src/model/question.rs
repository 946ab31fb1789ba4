use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Subject assigned when neither the record nor its source names one.
pub const DEFAULT_SUBJECT: &str = "General";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question stem is missing or empty")]
    MissingStem,

    #[error("question has no alternatives")]
    MissingAlternatives,

    #[error("question has no correct label")]
    MissingCorrectLabel,

    #[error("correct label {label:?} is not an alternative")]
    UnknownCorrectLabel { label: String },
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Presentation category of a question.
///
/// The pool distinguishes four layouts; sources that omit the field
/// get the baseline [`QuestionKind::Type1`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionKind {
    #[default]
    Type1,
    Type2,
    Type3,
    Type4,
}

impl QuestionKind {
    /// Stable storage label for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Type1 => "type-1",
            QuestionKind::Type2 => "type-2",
            QuestionKind::Type3 => "type-3",
            QuestionKind::Type4 => "type-4",
        }
    }

    /// Parses a kind from a loosely formatted source label.
    ///
    /// Source batches write the kind in several spellings ("TIPO 2",
    /// "TYPE 2", "type-2"); only the trailing digit is significant.
    /// Anything unrecognized falls back to the baseline kind.
    #[must_use]
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().chars().last() {
            Some('2') => QuestionKind::Type2,
            Some('3') => QuestionKind::Type3,
            Some('4') => QuestionKind::Type4,
            _ => QuestionKind::Type1,
        }
    }
}

//
// ─── ALTERNATIVES ──────────────────────────────────────────────────────────────
//

/// Labelled answer alternatives for a question.
///
/// Keys are single-letter labels. Insertion order is preserved so the
/// presentation layer renders alternatives the way the source listed
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alternatives(IndexMap<String, String>);

impl Alternatives {
    #[must_use]
    pub fn new(map: IndexMap<String, String>) -> Self {
        Self(map)
    }

    /// Builds alternatives from `(label, text)` pairs, last write wins
    /// on duplicate labels.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    #[must_use]
    pub fn contains_label(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Partially resolved question, as produced by field-alias resolution
/// over a raw source record. [`QuestionDraft::validate`] turns it into
/// a canonical [`Question`] or rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: Option<QuestionId>,
    pub kind: Option<QuestionKind>,
    pub subject: Option<String>,
    pub stem: Option<String>,
    pub sub_items: Option<Vec<String>>,
    pub directive: Option<String>,
    pub alternatives: Option<Alternatives>,
    pub correct_label: Option<String>,
    pub rationale: Option<String>,
}

impl QuestionDraft {
    /// Validates the draft into a canonical question.
    ///
    /// Missing id, kind, subject, and rationale get defaults; a draft
    /// still missing its stem, alternatives, or correct label is
    /// invalid and rejected here.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a required field is absent or the
    /// correct label is not one of the alternatives.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let stem = self
            .stem
            .filter(|s| !s.trim().is_empty())
            .ok_or(QuestionError::MissingStem)?;

        let alternatives = self
            .alternatives
            .filter(|a| !a.is_empty())
            .ok_or(QuestionError::MissingAlternatives)?;

        let correct_label = self
            .correct_label
            .filter(|l| !l.trim().is_empty())
            .ok_or(QuestionError::MissingCorrectLabel)?;

        if !alternatives.contains_label(&correct_label) {
            return Err(QuestionError::UnknownCorrectLabel {
                label: correct_label,
            });
        }

        let id = self.id.unwrap_or_else(|| QuestionId::derived(&stem));

        Ok(Question {
            id,
            kind: self.kind.unwrap_or_default(),
            subject: self
                .subject
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_owned()),
            stem,
            sub_items: self.sub_items,
            directive: self.directive,
            alternatives,
            correct_label,
            rationale: self.rationale.unwrap_or_default(),
        })
    }
}

/// Canonical quiz question.
///
/// Invariant (enforced by [`QuestionDraft::validate`] and re-checked
/// when rehydrating from storage): non-empty stem, non-empty
/// alternatives, and `correct_label` is one of the alternative labels.
///
/// `sub_items` and `directive` stay `None` when the source had no such
/// section, which is distinct from an empty list for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub subject: String,
    pub stem: String,
    pub sub_items: Option<Vec<String>>,
    pub directive: Option<String>,
    pub alternatives: Alternatives,
    pub correct_label: String,
    pub rationale: String,
}

impl Question {
    /// Returns true if the given label is the correct answer.
    #[must_use]
    pub fn is_correct(&self, label: &str) -> bool {
        self.correct_label == label
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
