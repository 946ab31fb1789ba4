//! Schema normalization for raw question records.
//!
//! Source batches were written over several generations of tooling
//! and name the same fields differently. Each canonical field has a
//! fixed alias table, resolved in priority order; the first key
//! present and non-null wins. Everything else about a record is
//! handled by draft validation in the core crate.

use serde_json::Value;
use thiserror::Error;

use quiz_core::model::{
    Alternatives, Question, QuestionDraft, QuestionError, QuestionId, QuestionKind,
};

/// Alias tables per canonical field, highest priority first.
const ID_ALIASES: &[&str] = &["id"];
const KIND_ALIASES: &[&str] = &["type", "tipo"];
const SUBJECT_ALIASES: &[&str] = &["tema", "topic", "subject"];
const STEM_ALIASES: &[&str] = &["stem", "enunciado"];
const SUB_ITEM_ALIASES: &[&str] = &["subItems", "sub_items", "itens", "items"];
const DIRECTIVE_ALIASES: &[&str] = &["directive", "comando"];
const ALTERNATIVE_ALIASES: &[&str] = &["alternatives", "alternativas", "options", "opcoes"];
const CORRECT_LABEL_ALIASES: &[&str] = &[
    "correctLabel",
    "correct_label",
    "resposta_correta",
    "correct_answer",
    "correta",
    "correct",
];
const RATIONALE_ALIASES: &[&str] = &["rationale", "justificativa"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Invalid(#[from] QuestionError),
}

/// Maps one raw source record into a canonical [`Question`].
///
/// Pure: the input is never mutated. `default_subject` is the subject
/// inferred from the source's name and applies only when the record
/// itself carries none.
///
/// # Errors
///
/// Returns `NormalizeError` if the record is not an object or if it is
/// still missing its stem, alternatives, or correct label after alias
/// resolution. Callers drop such records with a warning and continue.
pub fn normalize_record(raw: &Value, default_subject: &str) -> Result<Question, NormalizeError> {
    let record = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

    let resolve = |aliases: &[&str]| -> Option<&Value> {
        aliases
            .iter()
            .find_map(|key| record.get(*key))
            .filter(|v| !v.is_null())
    };

    let draft = QuestionDraft {
        id: resolve(ID_ALIASES).and_then(scalar_string).map(QuestionId::new),
        kind: resolve(KIND_ALIASES)
            .and_then(Value::as_str)
            .map(QuestionKind::parse_loose),
        subject: resolve(SUBJECT_ALIASES)
            .and_then(scalar_string)
            .or_else(|| Some(default_subject.to_owned())),
        stem: resolve(STEM_ALIASES).and_then(scalar_string),
        sub_items: resolve(SUB_ITEM_ALIASES).and_then(string_list),
        directive: resolve(DIRECTIVE_ALIASES).and_then(scalar_string),
        alternatives: resolve(ALTERNATIVE_ALIASES).and_then(alternative_map),
        correct_label: resolve(CORRECT_LABEL_ALIASES).and_then(scalar_string),
        rationale: resolve(RATIONALE_ALIASES).and_then(scalar_string),
    };

    Ok(draft.validate()?)
}

/// Strings stay as-is; numeric ids in old batches become their decimal
/// rendering.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(scalar_string).collect())
}

fn alternative_map(value: &Value) -> Option<Alternatives> {
    let entries = value.as_object()?;
    Some(Alternatives::from_pairs(
        entries
            .iter()
            .filter_map(|(label, text)| scalar_string(text).map(|t| (label.clone(), t))),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_a_legacy_portuguese_record() {
        let raw = json!({
            "id": "q1",
            "tipo": "TIPO 2",
            "tema": "Física",
            "enunciado": "Assinale a alternativa correta.",
            "itens": ["I. afirmação", "II. outra"],
            "comando": "julgue os itens acima",
            "opcoes": {"a": "certo", "b": "errado"},
            "correta": "a",
            "justificativa": "porque sim"
        });

        let q = normalize_record(&raw, "General").unwrap();
        assert_eq!(q.id, QuestionId::new("q1"));
        assert_eq!(q.kind, QuestionKind::Type2);
        assert_eq!(q.subject, "Física");
        assert_eq!(q.stem, "Assinale a alternativa correta.");
        assert_eq!(q.sub_items.as_ref().unwrap().len(), 2);
        assert_eq!(q.directive.as_deref(), Some("julgue os itens acima"));
        assert_eq!(q.alternatives.get("a"), Some("certo"));
        assert_eq!(q.correct_label, "a");
        assert_eq!(q.rationale, "porque sim");
    }

    #[test]
    fn canonical_names_win_over_aliases() {
        let raw = json!({
            "id": "q1",
            "stem": "canonical stem",
            "enunciado": "legacy stem",
            "alternatives": {"a": "new"},
            "alternativas": {"z": "old"},
            "resposta_correta": "a",
            "correta": "z"
        });

        let q = normalize_record(&raw, "General").unwrap();
        assert_eq!(q.stem, "canonical stem");
        assert_eq!(q.alternatives.get("a"), Some("new"));
        assert!(q.alternatives.get("z").is_none());
        assert_eq!(q.correct_label, "a");
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let raw = json!({
            "enunciado": "minimal record",
            "opcoes": {"a": "x", "b": "y"},
            "correta": "b"
        });

        let q = normalize_record(&raw, "Sensing").unwrap();
        assert_eq!(q.id, QuestionId::derived("minimal record"));
        assert_eq!(q.kind, QuestionKind::Type1);
        assert_eq!(q.subject, "Sensing");
        assert!(q.sub_items.is_none());
        assert!(q.directive.is_none());
        assert_eq!(q.rationale, "");
    }

    #[test]
    fn null_alias_values_count_as_missing() {
        let raw = json!({
            "enunciado": "stem",
            "itens": null,
            "opcoes": {"a": "x"},
            "correta": "a"
        });

        let q = normalize_record(&raw, "General").unwrap();
        assert!(q.sub_items.is_none());
    }

    #[test]
    fn record_without_alternatives_is_rejected() {
        let raw = json!({
            "enunciado": "stem",
            "correta": "a"
        });

        let err = normalize_record(&raw, "General").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Invalid(QuestionError::MissingAlternatives)
        );
    }

    #[test]
    fn record_without_correct_label_is_rejected() {
        let raw = json!({
            "enunciado": "stem",
            "opcoes": {"a": "x"}
        });

        let err = normalize_record(&raw, "General").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Invalid(QuestionError::MissingCorrectLabel)
        );
    }

    #[test]
    fn non_object_record_is_rejected() {
        assert_eq!(
            normalize_record(&json!("just a string"), "General").unwrap_err(),
            NormalizeError::NotAnObject
        );
    }

    #[test]
    fn numeric_id_is_rendered_as_text() {
        let raw = json!({
            "id": 17,
            "enunciado": "stem",
            "opcoes": {"a": "x"},
            "correta": "a"
        });

        let q = normalize_record(&raw, "General").unwrap();
        assert_eq!(q.id, QuestionId::new("17"));
    }
}
