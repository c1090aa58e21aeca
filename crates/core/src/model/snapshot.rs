use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Question;

/// Durable image of an in-flight session, written after every mutating
/// action and deleted on completion or abandonment.
///
/// Stored as a single JSON payload under one well-known key; the session
/// engine is its only reader and writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub questions: Vec<Question>,
    pub user_answers: Vec<Option<usize>>,
    pub current_index: usize,
    pub timestamp: DateTime<Utc>,
}

impl ProgressSnapshot {
    /// Whether this snapshot can resume a session over `questions`.
    ///
    /// A snapshot only matches when the question count is identical; a
    /// mismatch means the quiz changed underneath and the snapshot is
    /// discarded.
    #[must_use]
    pub fn matches(&self, questions: &[Question]) -> bool {
        self.questions.len() == questions.len()
    }

    /// Internal consistency: answer slots line up with questions, the
    /// current index is valid, and every recorded answer is in range for
    /// its question.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.user_answers.len() == self.questions.len()
            && self.current_index < self.questions.len()
            && self
                .user_answers
                .iter()
                .zip(&self.questions)
                .all(|(answer, question)| {
                    answer.is_none_or(|index| index < question.answer_count())
                })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use crate::time::fixed_now;

    fn question(text: &str) -> Question {
        Question::new(
            text,
            QuestionKind::TrueFalse,
            vec!["True".into(), "False".into()],
            0,
        )
        .unwrap()
    }

    fn snapshot() -> ProgressSnapshot {
        ProgressSnapshot {
            questions: vec![question("Q1"), question("Q2")],
            user_answers: vec![Some(1), None],
            current_index: 1,
            timestamp: fixed_now(),
        }
    }

    #[test]
    fn matches_on_question_count_only() {
        let snap = snapshot();
        assert!(snap.matches(&[question("other"), question("texts")]));
        assert!(!snap.matches(&[question("one")]));
    }

    #[test]
    fn well_formed_checks_lengths_and_ranges() {
        let mut snap = snapshot();
        assert!(snap.is_well_formed());

        snap.current_index = 2;
        assert!(!snap.is_well_formed());

        let mut snap = snapshot();
        snap.user_answers = vec![Some(5), None];
        assert!(!snap.is_well_formed());

        let mut snap = snapshot();
        snap.user_answers.pop();
        assert!(!snap.is_well_formed());
    }
}
