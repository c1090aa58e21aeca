use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// The two supported question shapes.
///
/// Multiple-choice questions carry exactly four answers labelled A–D;
/// true/false questions carry exactly two answers labelled T/F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

const MULTIPLE_CHOICE_LABELS: [&str; 4] = ["A", "B", "C", "D"];
const TRUE_FALSE_LABELS: [&str; 2] = ["T", "F"];

impl QuestionKind {
    /// Number of answers a question of this kind must carry.
    #[must_use]
    pub fn required_answer_count(self) -> usize {
        match self {
            QuestionKind::MultipleChoice => 4,
            QuestionKind::TrueFalse => 2,
        }
    }

    /// Answer labels for this kind, in answer order.
    #[must_use]
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            QuestionKind::MultipleChoice => &MULTIPLE_CHOICE_LABELS,
            QuestionKind::TrueFalse => &TRUE_FALSE_LABELS,
        }
    }

    /// Label for the answer at `index`.
    ///
    /// Total within `0..required_answer_count()`. An out-of-range index is a
    /// caller bug, not a recoverable condition.
    ///
    /// # Panics
    ///
    /// Panics if `index >= required_answer_count()`.
    #[must_use]
    pub fn label(self, index: usize) -> &'static str {
        self.labels()
            .get(index)
            .unwrap_or_else(|| panic!("answer index {index} out of range for {self}"))
    }

    /// Infer the kind from an answer list.
    ///
    /// Returns `TrueFalse` iff the answers are exactly the two strings
    /// "True" and "False" in either order; anything else is multiple choice.
    /// Used only when a question omits an explicit kind.
    #[must_use]
    pub fn detect<S: AsRef<str>>(answers: &[S]) -> Self {
        if let [a, b] = answers {
            let (a, b) = (a.as_ref(), b.as_ref());
            if (a == "True" && b == "False") || (a == "False" && b == "True") {
                return QuestionKind::TrueFalse;
            }
        }
        QuestionKind::MultipleChoice
    }

    /// Stable string form used by storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::TrueFalse => "true_false",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a `QuestionKind` from its stable string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question kind: {raw}")]
pub struct ParseQuestionKindError {
    raw: String,
}

impl FromStr for QuestionKind {
    type Err = ParseQuestionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            "true_false" => Ok(QuestionKind::TrueFalse),
            other => Err(ParseQuestionKindError {
                raw: other.to_string(),
            }),
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural rejection reasons for a question.
///
/// The stored index is only used to point a human at the offending entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {} is missing its text", .index + 1)]
    MissingText { index: usize },

    #[error("question {} has no answers", .index + 1)]
    MissingAnswers { index: usize },

    #[error(
        "question {} must have exactly {} answers (got {})",
        .index + 1,
        .expected,
        .got
    )]
    WrongAnswerCount {
        index: usize,
        kind: QuestionKind,
        expected: usize,
        got: usize,
    },

    #[error(
        "question {} marks answer {} as correct but only has {} answers",
        .index + 1,
        .got,
        .len
    )]
    CorrectAnswerOutOfRange { index: usize, got: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single quiz question: text, kind, and an ordered answer list.
///
/// Immutable once built; the answer count is guaranteed to match the kind.
/// Serializable because it is embedded in the progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    text: String,
    kind: QuestionKind,
    answers: Vec<String>,
}

impl Question {
    /// Build a question, enforcing the kind's answer-count rule.
    ///
    /// `index` locates the question in its source for error messages only.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is empty, the answers are
    /// missing, or the answer count does not match the kind.
    pub fn new(
        text: impl Into<String>,
        kind: QuestionKind,
        answers: Vec<String>,
        index: usize,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::MissingText { index });
        }
        if answers.is_empty() {
            return Err(QuestionError::MissingAnswers { index });
        }
        let expected = kind.required_answer_count();
        if answers.len() != expected {
            return Err(QuestionError::WrongAnswerCount {
                index,
                kind,
                expected,
                got: answers.len(),
            });
        }

        Ok(Self {
            text,
            kind,
            answers,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Number of answers; equals the kind's required count.
    #[must_use]
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// Label for the answer at `index` under this question's kind.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; see [`QuestionKind::label`].
    #[must_use]
    pub fn label(&self, index: usize) -> &'static str {
        self.kind.label(index)
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from the JSON import format:
/// `{question, answers, type?, correct_answer?}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionDraft {
    #[serde(default, alias = "question")]
    pub text: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<QuestionKind>,
    #[serde(default)]
    pub correct_answer: Option<usize>,
}

/// A draft that passed validation, with its optional correct-answer index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub question: Question,
    pub correct: Option<usize>,
}

impl QuestionDraft {
    /// Validate the draft into a domain `Question`.
    ///
    /// The kind is taken from the draft when present, otherwise inferred via
    /// [`QuestionKind::detect`]. `index` locates the draft in its source for
    /// error messages only.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when text or answers are missing, the answer
    /// count does not match the kind, or `correct_answer` is out of range.
    pub fn validate(self, index: usize) -> Result<ValidatedQuestion, QuestionError> {
        let text = self
            .text
            .ok_or(QuestionError::MissingText { index })?;
        let kind = self
            .kind
            .unwrap_or_else(|| QuestionKind::detect(&self.answers));
        let len = self.answers.len();
        let question = Question::new(text, kind, self.answers, index)?;

        if let Some(correct) = self.correct_answer {
            if correct >= len {
                return Err(QuestionError::CorrectAnswerOutOfRange {
                    index,
                    got: correct,
                    len,
                });
            }
        }

        Ok(ValidatedQuestion {
            question,
            correct: self.correct_answer,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
