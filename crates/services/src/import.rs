use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{QuestionDraft, QuizId, ValidatedQuestion};
use storage::repository::{NewQuestionRecord, NewQuizRecord, QuizRepository};

use crate::error::ImportError;
use crate::notifier::{CatalogChange, ChangeNotifier};

/// Accepts quizzes as a JSON array of `{question, answers, type?,
/// correct_answer?}` entries and persists them into the catalog.
#[derive(Clone)]
pub struct QuizImportService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    notifier: ChangeNotifier,
}

impl QuizImportService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>, notifier: ChangeNotifier) -> Self {
        Self {
            clock,
            quizzes,
            notifier,
        }
    }

    /// Parse and validate an import payload without persisting anything.
    ///
    /// The first structural problem rejects the whole payload with a
    /// human-readable reason.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` for malformed JSON, an empty array, or any
    /// entry failing question validation.
    pub fn parse(json: &str) -> Result<Vec<ValidatedQuestion>, ImportError> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
        if drafts.is_empty() {
            return Err(ImportError::Empty);
        }
        drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Ok(draft.validate(index)?))
            .collect()
    }

    /// Import a quiz into the catalog and announce it on the catalog
    /// stream.
    ///
    /// Every question must carry a correct answer; an imported quiz always
    /// has a complete answer key.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` for invalid payloads, a blank title, a
    /// question without a correct answer, or storage failures.
    pub async fn import(&self, title: &str, json: &str) -> Result<QuizId, ImportError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ImportError::EmptyTitle);
        }

        let validated = Self::parse(json)?;
        let questions = validated
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let correct_index = entry
                    .correct
                    .ok_or(ImportError::MissingCorrectAnswer { index })?;
                Ok(NewQuestionRecord {
                    text: entry.question.text().to_owned(),
                    kind: entry.question.kind(),
                    answers: entry.question.answers().to_vec(),
                    correct_index,
                })
            })
            .collect::<Result<Vec<_>, ImportError>>()?;

        let quiz_id = self
            .quizzes
            .insert_quiz(NewQuizRecord {
                title: title.to_string(),
                questions,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::debug!("imported quiz {quiz_id} ({title})");
        self.notifier
            .publish_catalog(CatalogChange::QuizAdded(quiz_id));
        Ok(quiz_id)
    }

    /// Remove a quiz from the catalog and announce the removal.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Storage` if the quiz does not exist or cannot
    /// be removed.
    pub async fn remove(&self, quiz_id: QuizId) -> Result<(), ImportError> {
        self.quizzes.delete_quiz(quiz_id).await?;
        self.notifier
            .publish_catalog(CatalogChange::QuizRemoved(quiz_id));
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
