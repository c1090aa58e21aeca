use quiz_core::model::{AnswerId, Question, QuizId};
use storage::repository::{AnswerRow, QuestionRow};

use crate::error::PlanError;

/// Everything a session needs, computed up front: the questions, the local
/// correct-answer indices, and (for catalog-backed quizzes) the durable
/// answer identities the recorder will need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    quiz_id: Option<QuizId>,
    questions: Vec<Question>,
    correct: Vec<usize>,
    answer_ids: Option<Vec<Vec<AnswerId>>>,
}

impl SessionPlan {
    /// Build a plan from catalog rows.
    ///
    /// Each question's persisted `correct_answer_id` is mapped to a local
    /// 0-based index by position lookup in its answer-id list.
    ///
    /// # Errors
    ///
    /// Returns `PlanError` when there are no questions, a stored question
    /// fails validation, or a `correct_answer_id` is not among its
    /// question's answers.
    pub fn from_rows(
        quiz_id: QuizId,
        rows: Vec<(QuestionRow, Vec<AnswerRow>)>,
    ) -> Result<Self, PlanError> {
        if rows.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut questions = Vec::with_capacity(rows.len());
        let mut correct = Vec::with_capacity(rows.len());
        let mut answer_ids = Vec::with_capacity(rows.len());

        for (question, answers) in rows {
            let texts: Vec<String> = answers.iter().map(|row| row.text.clone()).collect();
            let ids: Vec<AnswerId> = answers.iter().map(|row| row.id).collect();

            let index = ids
                .iter()
                .position(|id| *id == question.correct_answer_id)
                .ok_or(PlanError::UnknownCorrectAnswer {
                    question_id: question.id,
                })?;

            questions.push(Question::new(
                question.text,
                question.kind,
                texts,
                question.position as usize,
            )?);
            correct.push(index);
            answer_ids.push(ids);
        }

        Ok(Self {
            quiz_id: Some(quiz_id),
            questions,
            correct,
            answer_ids: Some(answer_ids),
        })
    }

    /// Build a plan for an ad hoc (unsaved) question set.
    ///
    /// The correct-answer indices are a required input here; a session is
    /// never started against a silently invented answer key.
    ///
    /// # Errors
    ///
    /// Returns `PlanError` when the inputs are empty, the lengths disagree,
    /// or a correct index is out of range for its question.
    pub fn from_questions(
        questions: Vec<Question>,
        correct: Vec<usize>,
    ) -> Result<Self, PlanError> {
        if questions.is_empty() {
            return Err(PlanError::Empty);
        }
        if questions.len() != correct.len() {
            return Err(PlanError::LengthMismatch {
                questions: questions.len(),
                correct: correct.len(),
            });
        }
        for (index, (question, answer)) in questions.iter().zip(&correct).enumerate() {
            if *answer >= question.answer_count() {
                return Err(PlanError::CorrectOutOfRange {
                    index,
                    got: *answer,
                    len: question.answer_count(),
                });
            }
        }

        Ok(Self {
            quiz_id: None,
            questions,
            correct,
            answer_ids: None,
        })
    }

    /// Durable quiz identity; `None` for ad hoc question sets.
    #[must_use]
    pub fn quiz_id(&self) -> Option<QuizId> {
        self.quiz_id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn correct(&self) -> &[usize] {
        &self.correct
    }

    /// Durable answer identities per question; `None` for ad hoc sets.
    #[must_use]
    pub fn answer_ids(&self) -> Option<&[Vec<AnswerId>]> {
        self.answer_ids.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
