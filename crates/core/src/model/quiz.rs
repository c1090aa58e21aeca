use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::QuizId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,
}

/// Catalog entry for a stored quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    question_count: u32,
    created_at: DateTime<Utc>,
}

impl Quiz {
    /// Rehydrate a quiz catalog entry from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is blank.
    pub fn from_persisted(
        id: QuizId,
        title: impl Into<String>,
        question_count: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            question_count,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_blank_title() {
        let err = Quiz::from_persisted(QuizId::new(1), "  ", 4, fixed_now()).unwrap_err();
        assert_eq!(err, QuizError::EmptyTitle);
    }

    #[test]
    fn exposes_fields() {
        let quiz = Quiz::from_persisted(QuizId::new(7), "Capitals", 10, fixed_now()).unwrap();
        assert_eq!(quiz.id(), QuizId::new(7));
        assert_eq!(quiz.title(), "Capitals");
        assert_eq!(quiz.question_count(), 10);
    }
}
