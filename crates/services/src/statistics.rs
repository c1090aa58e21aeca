use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::model::{AnswerId, QuestionId, QuizId};
use storage::repository::{StatisticsRepository, SubmissionRepository};

use crate::error::StatisticsError;

/// Display name for submissions with no attached identity.
const GUEST_NAME: &str = "guest";

/// Quiz-level aggregate view; score fields are `None` with no submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStatisticsView {
    pub submission_count: u64,
    pub average_score: Option<u32>,
    pub highest_score: Option<u32>,
    pub lowest_score: Option<u32>,
    pub question_count: u32,
}

/// Question-level guess aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionStatisticsView {
    pub question_id: QuestionId,
    pub text: String,
    pub total_guesses: u64,
    pub correct_guesses: u64,
    pub correct_percentage: u32,
    pub correct_answer_id: AnswerId,
}

/// Answer-level guess counts; `percentage` is of the question's total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerStatisticsView {
    pub answer_id: AnswerId,
    pub text: String,
    pub label: String,
    pub guesses: u64,
    pub percentage: u32,
    pub is_correct: bool,
}

/// One leaderboard row, best scores first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user: String,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score_percentage: u32,
    pub submitted_at: DateTime<Utc>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rounded(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

#[allow(clippy::cast_precision_loss)]
fn ratio_percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    rounded(part as f64 / whole as f64 * 100.0)
}

/// Read side of the statistics contract.
///
/// Each view is recomputed wholesale from the backing store on every call;
/// nothing is cached here, and the three views fail independently.
#[derive(Clone)]
pub struct StatisticsService {
    statistics: Arc<dyn StatisticsRepository>,
    submissions: Arc<dyn SubmissionRepository>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(
        statistics: Arc<dyn StatisticsRepository>,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            statistics,
            submissions,
        }
    }

    /// Quiz-level view: submission count, average/high/low score, question
    /// count.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if the backing query fails.
    pub async fn quiz_view(&self, quiz_id: QuizId) -> Result<QuizStatisticsView, StatisticsError> {
        let row = self.statistics.quiz_statistics(quiz_id).await?;
        Ok(QuizStatisticsView {
            submission_count: row.submission_count,
            average_score: row.average_percentage.map(rounded),
            highest_score: row.highest_percentage.map(rounded),
            lowest_score: row.lowest_percentage.map(rounded),
            question_count: row.question_count,
        })
    }

    /// Question-level view for a quiz, in question order.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if the backing query fails.
    pub async fn question_view(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuestionStatisticsView>, StatisticsError> {
        let rows = self.statistics.question_statistics(quiz_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| QuestionStatisticsView {
                question_id: row.question_id,
                text: row.text,
                correct_percentage: ratio_percentage(row.correct_guesses, row.total_guesses),
                total_guesses: row.total_guesses,
                correct_guesses: row.correct_guesses,
                correct_answer_id: row.correct_answer_id,
            })
            .collect())
    }

    /// Answer-level view for a question, in answer order.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if the backing query fails.
    pub async fn answer_view(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerStatisticsView>, StatisticsError> {
        let rows = self.statistics.answer_statistics(question_id).await?;
        let total: u64 = rows.iter().map(|row| row.guesses).sum();
        Ok(rows
            .into_iter()
            .map(|row| AnswerStatisticsView {
                answer_id: row.answer_id,
                text: row.text,
                label: row.label,
                percentage: ratio_percentage(row.guesses, total),
                guesses: row.guesses,
                is_correct: row.is_correct,
            })
            .collect())
    }

    /// Leaderboard for a quiz, best score first; guests get a placeholder
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError` if the backing query fails.
    pub async fn leaderboard(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, StatisticsError> {
        let rows = self.submissions.list_submissions(quiz_id, limit).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let submission = row.submission;
                LeaderboardEntry {
                    user: submission
                        .user_id()
                        .map_or_else(|| GUEST_NAME.to_string(), str::to_string),
                    score_percentage: submission.score_percentage(),
                    correct_count: submission.correct_count(),
                    total_questions: submission.total_questions(),
                    submitted_at: submission.submitted_at(),
                }
            })
            .collect())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionKind, Submission};
    use quiz_core::time::fixed_now;
    use storage::repository::{
        InMemoryRepository, NewQuestionRecord, NewQuizRecord, QuizRepository,
        SubmissionRepository,
    };

    fn service(repo: &InMemoryRepository) -> StatisticsService {
        StatisticsService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    async fn seeded(repo: &InMemoryRepository) -> QuizId {
        repo.insert_quiz(NewQuizRecord {
            title: "Sample".into(),
            created_at: fixed_now(),
            questions: vec![NewQuestionRecord {
                text: "Pick".into(),
                kind: QuestionKind::TrueFalse,
                answers: vec!["True".into(), "False".into()],
                correct_index: 0,
            }],
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn quiz_view_rounds_scores() {
        let repo = InMemoryRepository::new();
        let quiz_id = seeded(&repo).await;

        for correct in [1_u32, 0, 0] {
            let submission =
                Submission::new(quiz_id, None, correct, 3, fixed_now()).unwrap();
            repo.append_submission(&submission).await.unwrap();
        }

        let view = service(&repo).quiz_view(quiz_id).await.unwrap();
        assert_eq!(view.submission_count, 3);
        assert_eq!(view.question_count, 1);
        // mean of 33.33, 0, 0 is 11.11 -> 11
        assert_eq!(view.average_score, Some(11));
        assert_eq!(view.highest_score, Some(33));
        assert_eq!(view.lowest_score, Some(0));
    }

    #[tokio::test]
    async fn empty_quiz_view_has_no_scores() {
        let repo = InMemoryRepository::new();
        let quiz_id = seeded(&repo).await;
        let view = service(&repo).quiz_view(quiz_id).await.unwrap();
        assert_eq!(view.submission_count, 0);
        assert_eq!(view.average_score, None);
        assert_eq!(view.highest_score, None);
    }

    #[tokio::test]
    async fn question_and_answer_views_compute_percentages() {
        let repo = InMemoryRepository::new();
        let quiz_id = seeded(&repo).await;
        let question = repo.get_questions(quiz_id).await.unwrap().remove(0);
        let answers = repo.get_answers(question.id).await.unwrap();

        repo.increment_guess(answers[0].id).await.unwrap();
        repo.increment_guess(answers[0].id).await.unwrap();
        repo.increment_guess(answers[1].id).await.unwrap();

        let stats = service(&repo);
        let questions = stats.question_view(quiz_id).await.unwrap();
        assert_eq!(questions[0].total_guesses, 3);
        assert_eq!(questions[0].correct_guesses, 2);
        assert_eq!(questions[0].correct_percentage, 67);

        let answer_views = stats.answer_view(question.id).await.unwrap();
        assert_eq!(answer_views[0].percentage, 67);
        assert!(answer_views[0].is_correct);
        assert_eq!(answer_views[1].percentage, 33);
        assert!(!answer_views[1].is_correct);
    }

    #[tokio::test]
    async fn untouched_question_percentages_are_zero() {
        let repo = InMemoryRepository::new();
        let quiz_id = seeded(&repo).await;
        let question = repo.get_questions(quiz_id).await.unwrap().remove(0);

        let stats = service(&repo);
        let questions = stats.question_view(quiz_id).await.unwrap();
        assert_eq!(questions[0].correct_percentage, 0);

        let answer_views = stats.answer_view(question.id).await.unwrap();
        assert!(answer_views.iter().all(|view| view.percentage == 0));
    }

    #[tokio::test]
    async fn leaderboard_names_guests() {
        let repo = InMemoryRepository::new();
        let quiz_id = seeded(&repo).await;

        for (correct, user) in [(1_u32, Some("ada")), (0, None)] {
            let submission =
                Submission::new(quiz_id, user.map(str::to_string), correct, 1, fixed_now())
                    .unwrap();
            repo.append_submission(&submission).await.unwrap();
        }

        let board = service(&repo).leaderboard(quiz_id, 10).await.unwrap();
        assert_eq!(board[0].user, "ada");
        assert_eq!(board[0].score_percentage, 100);
        assert_eq!(board[1].user, "guest");
        assert_eq!(board[1].score_percentage, 0);
    }
}
