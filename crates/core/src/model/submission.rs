use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::QuizId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("a submission needs at least one question")]
    NoQuestions,

    #[error("correct count ({correct}) exceeds total questions ({total})")]
    CountExceedsTotal { correct: u32, total: u32 },
}

/// Immutable record of a completed session's outcome.
///
/// Created exactly once per completed session, never mutated or deleted.
/// The score percentage is derived, not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    quiz_id: QuizId,
    user_id: Option<String>,
    correct_count: u32,
    total_questions: u32,
    submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Build a submission for a freshly completed session.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` when the totals are inconsistent.
    pub fn new(
        quiz_id: QuizId,
        user_id: Option<String>,
        correct_count: u32,
        total_questions: u32,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, SubmissionError> {
        if total_questions == 0 {
            return Err(SubmissionError::NoQuestions);
        }
        if correct_count > total_questions {
            return Err(SubmissionError::CountExceedsTotal {
                correct: correct_count,
                total: total_questions,
            });
        }

        Ok(Self {
            quiz_id,
            user_id,
            correct_count,
            total_questions,
            submitted_at,
        })
    }

    /// Rehydrate a submission from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` when the totals are inconsistent.
    pub fn from_persisted(
        quiz_id: QuizId,
        user_id: Option<String>,
        correct_count: u32,
        total_questions: u32,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, SubmissionError> {
        Self::new(
            quiz_id,
            user_id,
            correct_count,
            total_questions,
            submitted_at,
        )
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// Identity of the submitting user; `None` for guest sessions.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Score as a percentage rounded to the nearest integer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn score_percentage(&self) -> u32 {
        score_percentage(self.correct_count, self.total_questions)
    }
}

/// `round(correct / total * 100)`; 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u32
}
