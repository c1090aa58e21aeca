//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuestionId, SubmissionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors building a session plan from catalog rows or ad hoc input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanError {
    #[error("no questions available for session")]
    Empty,

    #[error("{correct} correct answers for {questions} questions")]
    LengthMismatch { questions: usize, correct: usize },

    #[error(
        "correct answer {} out of range for question {} ({} answers)",
        .got,
        .index + 1,
        .len
    )]
    CorrectOutOfRange { index: usize, got: usize, len: usize },

    #[error("question {question_id} does not contain its correct answer id")]
    UnknownCorrectAnswer { question_id: QuestionId },

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Errors emitted by the session engine and workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already completed")]
    Completed,

    #[error("answer index {index} out of range ({len} answers)")]
    AnswerOutOfRange { index: usize, len: usize },

    #[error("current question has no answer selected")]
    CurrentUnanswered,

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatisticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatisticsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizImportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("import contains no questions")]
    Empty,

    #[error("invalid quiz JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error("question {} has no correct answer", .index + 1)]
    MissingCorrectAnswer { index: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
