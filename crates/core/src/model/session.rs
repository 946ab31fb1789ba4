use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("no questions available for a sitting")]
    Empty,
}

//
// ─── TRANSITION OUTPUTS ────────────────────────────────────────────────────────
//

/// Payload produced by a successful reveal, carrying everything the
/// services layer needs to persist the response event.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealOutcome {
    pub question_id: QuestionId,
    pub selected_label: String,
    pub is_correct: bool,
    /// Wall-clock seconds spent on the question, captured at reveal.
    pub time_seconds: u32,
    /// Running score after this reveal.
    pub score: f64,
}

/// Result of advancing past the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the next question; per-question state cleared.
    Next,
    /// The sitting reached its last question. The final score is
    /// reported and the sitting restarts from the first question with
    /// a fresh score and clocks (endless practice).
    Completed { final_score: f64 },
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Ephemeral state for one sitting through a randomized question set.
///
/// Transitions are pure with respect to time: every time-dependent
/// operation takes the current instant explicitly, so the machine is
/// deterministic under a fixed clock.
///
/// Per question the machine is `Unanswered -> Selected -> Revealed`;
/// reveal is one-way, and out-of-order calls (`select` after reveal,
/// `reveal` without a selection, a second `reveal`) are silent no-ops
/// since they stem from presentation-layer races, not programmer
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    questions: Vec<Question>,
    current: usize,
    selected: Option<String>,
    revealed: bool,
    score: f64,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
}

impl SessionState {
    /// Starts a sitting over an already-ordered question sequence.
    ///
    /// The caller is responsible for shuffling; the state machine
    /// attaches no meaning to the order it is given.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>, now: DateTime<Utc>) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::Empty);
        }
        Ok(Self {
            questions,
            current: 0,
            selected: None,
            revealed: false,
            score: 0.0,
            started_at: now,
            question_started_at: now,
        })
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records a tentative answer for the current question.
    ///
    /// Reselecting is allowed; selecting after the question is
    /// revealed is ignored. Nothing is scored or persisted here.
    pub fn select(&mut self, label: impl Into<String>) {
        if self.revealed {
            return;
        }
        self.selected = Some(label.into());
    }

    /// Freezes the current question as revealed and scores it.
    ///
    /// A correct answer adds `10 / total_questions` so a perfect run
    /// sums to exactly 10 regardless of set size.
    ///
    /// Returns `None` without changing anything if nothing is selected
    /// or the question is already revealed, which also makes a double
    /// reveal score-neutral and write-free.
    pub fn reveal(&mut self, now: DateTime<Utc>) -> Option<RevealOutcome> {
        if self.revealed {
            return None;
        }
        let selected = self.selected.clone()?;

        let question = &self.questions[self.current];
        let is_correct = question.is_correct(&selected);
        let spent = (now - self.question_started_at).num_seconds().max(0);

        self.revealed = true;
        if is_correct {
            self.score += 10.0 / self.questions.len() as f64;
        }

        Some(RevealOutcome {
            question_id: question.id.clone(),
            selected_label: selected,
            is_correct,
            time_seconds: u32::try_from(spent).unwrap_or(u32::MAX),
            score: self.score,
        })
    }

    /// Moves to the next question, or recycles the sitting when the
    /// last question has been passed.
    ///
    /// Advancing is legal from both the unanswered state (skipping)
    /// and the revealed state; either way the per-question selection,
    /// reveal flag, and clock are reset.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Advance {
        self.selected = None;
        self.revealed = false;
        self.question_started_at = now;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            return Advance::Next;
        }

        let final_score = self.score;
        self.current = 0;
        self.score = 0.0;
        self.started_at = now;
        Advance::Completed { final_score }
    }

    /// Formats the time since the sitting started as `mm:ss`.
    ///
    /// Display-only: scoring uses the per-question clock captured at
    /// reveal time, never this value.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> String {
        let seconds = (now - self.started_at).num_seconds().max(0);
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
