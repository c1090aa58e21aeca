use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerId, ProgressSnapshot, QuestionId, QuestionKind, Quiz, QuizId, Submission, SubmissionId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted shape of a question, with its durable correct-answer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRow {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub text: String,
    pub kind: QuestionKind,
    pub position: u32,
    pub correct_answer_id: AnswerId,
}

/// Persisted shape of an answer, including its running guess counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub text: String,
    pub label: String,
    pub position: u32,
    pub guess_count: u64,
}

/// Input for persisting one question of a new quiz.
///
/// Labels are derived from the kind and answer position at insert time;
/// `correct_index` is resolved to a durable answer id by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionRecord {
    pub text: String,
    pub kind: QuestionKind,
    pub answers: Vec<String>,
    pub correct_index: usize,
}

/// Input for persisting a new quiz with its questions and answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuizRecord {
    pub title: String,
    pub questions: Vec<NewQuestionRecord>,
    pub created_at: DateTime<Utc>,
}

/// A stored submission together with its row id, for leaderboard listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    pub id: SubmissionId,
    pub submission: Submission,
}

impl SubmissionRow {
    #[must_use]
    pub fn new(id: SubmissionId, submission: Submission) -> Self {
        Self { id, submission }
    }
}

//
// ─── STATISTICS ROWS ───────────────────────────────────────────────────────────
//

/// Raw quiz-level aggregates; percentages are left to the read side.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizStatisticsRow {
    pub submission_count: u64,
    pub average_percentage: Option<f64>,
    pub highest_percentage: Option<f64>,
    pub lowest_percentage: Option<f64>,
    pub question_count: u32,
}

/// Raw question-level guess aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionStatisticsRow {
    pub question_id: QuestionId,
    pub text: String,
    pub total_guesses: u64,
    pub correct_guesses: u64,
    pub correct_answer_id: AnswerId,
}

/// Raw answer-level guess counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerStatisticsRow {
    pub answer_id: AnswerId,
    pub text: String,
    pub label: String,
    pub guesses: u64,
    pub is_correct: bool,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Repository contract for the quiz catalog.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a quiz with its questions and answers; returns the new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored, including when a
    /// `correct_index` does not address one of its question's answers.
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError>;

    /// List catalog entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError>;

    /// Fetch one catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures; a missing quiz is
    /// `Ok(None)`.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// Remove a quiz and everything hanging off it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz does not exist.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;

    /// Questions of a quiz, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_questions(&self, quiz_id: QuizId) -> Result<Vec<QuestionRow>, StorageError>;

    /// Answers of a question, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn get_answers(&self, question_id: QuestionId) -> Result<Vec<AnswerRow>, StorageError>;
}

/// Repository contract for submissions and guess counters.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert one immutable submission record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_submission(
        &self,
        submission: &Submission,
    ) -> Result<SubmissionId, StorageError>;

    /// Bump the guess counter for one answer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown answer id.
    async fn increment_guess(&self, answer_id: AnswerId) -> Result<(), StorageError>;

    /// Submissions for a quiz, best score first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_submissions(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<SubmissionRow>, StorageError>;
}

/// Read-only aggregate queries backing the statistics views.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Quiz-level aggregates.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown quiz.
    async fn quiz_statistics(&self, quiz_id: QuizId) -> Result<QuizStatisticsRow, StorageError>;

    /// Per-question guess aggregates for a quiz, in question order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn question_statistics(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuestionStatisticsRow>, StorageError>;

    /// Per-answer guess counts for a question, in answer order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn answer_statistics(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerStatisticsRow>, StorageError>;
}

/// Durable store for the single in-flight progress snapshot.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the stored snapshot, if any.
    ///
    /// A payload that fails to parse is reported as absent, never as an
    /// error: corrupt resume data must not take the session down.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for transport failures.
    async fn load(&self) -> Result<Option<ProgressSnapshot>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError>;

    /// Remove the stored snapshot; absent is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport failures.
    async fn clear(&self) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct StoredQuiz {
    title: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    next_id: u64,
    quizzes: BTreeMap<QuizId, StoredQuiz>,
    questions: HashMap<QuizId, Vec<QuestionRow>>,
    answers: HashMap<QuestionId, Vec<AnswerRow>>,
    submissions: Vec<SubmissionRow>,
    // Kept as the serialized payload so the parse-or-absent contract is
    // exercised the same way as in the durable backend.
    snapshot: Option<String>,
}

impl InMemoryState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn percentage_of(row: &SubmissionRow) -> f64 {
    f64::from(row.submission.correct_count()) / f64::from(row.submission.total_questions()) * 100.0
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut state = self.lock()?;
        let quiz_id = QuizId::new(state.allocate_id());

        let mut question_rows = Vec::with_capacity(quiz.questions.len());
        for (position, question) in quiz.questions.iter().enumerate() {
            let question_id = QuestionId::new(state.allocate_id());
            let mut answer_rows = Vec::with_capacity(question.answers.len());
            for (answer_position, text) in question.answers.iter().enumerate() {
                let label = question.kind.labels().get(answer_position).ok_or_else(|| {
                    StorageError::Serialization(format!(
                        "answer position {answer_position} has no label for {}",
                        question.kind
                    ))
                })?;
                answer_rows.push(AnswerRow {
                    id: AnswerId::new(state.allocate_id()),
                    question_id,
                    text: text.clone(),
                    label: (*label).to_string(),
                    position: u32::try_from(answer_position)
                        .map_err(|_| StorageError::Serialization("position overflow".into()))?,
                    guess_count: 0,
                });
            }
            let correct_answer_id = answer_rows
                .get(question.correct_index)
                .map(|row| row.id)
                .ok_or_else(|| {
                    StorageError::Serialization(format!(
                        "correct index {} out of range",
                        question.correct_index
                    ))
                })?;

            state.answers.insert(question_id, answer_rows);
            question_rows.push(QuestionRow {
                id: question_id,
                quiz_id,
                text: question.text.clone(),
                kind: question.kind,
                position: u32::try_from(position)
                    .map_err(|_| StorageError::Serialization("position overflow".into()))?,
                correct_answer_id,
            });
        }

        state.questions.insert(quiz_id, question_rows);
        state.quizzes.insert(
            quiz_id,
            StoredQuiz {
                title: quiz.title,
                created_at: quiz.created_at,
            },
        );
        Ok(quiz_id)
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let state = self.lock()?;
        let mut entries: Vec<_> = state.quizzes.iter().collect();
        entries.sort_by(|(a_id, a), (b_id, b)| {
            b.created_at.cmp(&a.created_at).then(b_id.cmp(a_id))
        });

        let mut out = Vec::new();
        for (id, stored) in entries.into_iter().take(limit as usize) {
            let question_count = state
                .questions
                .get(id)
                .map_or(0, |rows| u32::try_from(rows.len()).unwrap_or(u32::MAX));
            out.push(
                Quiz::from_persisted(*id, stored.title.clone(), question_count, stored.created_at)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            );
        }
        Ok(out)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let state = self.lock()?;
        let Some(stored) = state.quizzes.get(&id) else {
            return Ok(None);
        };
        let question_count = state
            .questions
            .get(&id)
            .map_or(0, |rows| u32::try_from(rows.len()).unwrap_or(u32::MAX));
        Quiz::from_persisted(id, stored.title.clone(), question_count, stored.created_at)
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state.quizzes.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        if let Some(questions) = state.questions.remove(&id) {
            for question in &questions {
                state.answers.remove(&question.id);
            }
        }
        state.submissions.retain(|row| row.submission.quiz_id() != id);
        Ok(())
    }

    async fn get_questions(&self, quiz_id: QuizId) -> Result<Vec<QuestionRow>, StorageError> {
        let state = self.lock()?;
        Ok(state.questions.get(&quiz_id).cloned().unwrap_or_default())
    }

    async fn get_answers(&self, question_id: QuestionId) -> Result<Vec<AnswerRow>, StorageError> {
        let state = self.lock()?;
        Ok(state.answers.get(&question_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn append_submission(
        &self,
        submission: &Submission,
    ) -> Result<SubmissionId, StorageError> {
        let mut state = self.lock()?;
        let id = SubmissionId::new(state.allocate_id());
        state
            .submissions
            .push(SubmissionRow::new(id, submission.clone()));
        Ok(id)
    }

    async fn increment_guess(&self, answer_id: AnswerId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        for answers in state.answers.values_mut() {
            if let Some(answer) = answers.iter_mut().find(|row| row.id == answer_id) {
                answer.guess_count += 1;
                return Ok(());
            }
        }
        Err(StorageError::NotFound)
    }

    async fn list_submissions(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<SubmissionRow>, StorageError> {
        let state = self.lock()?;
        let mut rows: Vec<_> = state
            .submissions
            .iter()
            .filter(|row| row.submission.quiz_id() == quiz_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            percentage_of(b)
                .partial_cmp(&percentage_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.submission.submitted_at().cmp(&b.submission.submitted_at()))
        });
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[async_trait]
impl StatisticsRepository for InMemoryRepository {
    async fn quiz_statistics(&self, quiz_id: QuizId) -> Result<QuizStatisticsRow, StorageError> {
        let state = self.lock()?;
        if !state.quizzes.contains_key(&quiz_id) {
            return Err(StorageError::NotFound);
        }

        let percentages: Vec<f64> = state
            .submissions
            .iter()
            .filter(|row| row.submission.quiz_id() == quiz_id)
            .map(percentage_of)
            .collect();
        let question_count = state
            .questions
            .get(&quiz_id)
            .map_or(0, |rows| u32::try_from(rows.len()).unwrap_or(u32::MAX));

        let count = percentages.len();
        let average = if count == 0 {
            None
        } else {
            Some(percentages.iter().sum::<f64>() / count as f64)
        };
        let highest = percentages.iter().copied().fold(None, |acc: Option<f64>, p| {
            Some(acc.map_or(p, |a| a.max(p)))
        });
        let lowest = percentages.iter().copied().fold(None, |acc: Option<f64>, p| {
            Some(acc.map_or(p, |a| a.min(p)))
        });

        Ok(QuizStatisticsRow {
            submission_count: count as u64,
            average_percentage: average,
            highest_percentage: highest,
            lowest_percentage: lowest,
            question_count,
        })
    }

    async fn question_statistics(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuestionStatisticsRow>, StorageError> {
        let state = self.lock()?;
        let questions = state.questions.get(&quiz_id).cloned().unwrap_or_default();

        let mut out = Vec::with_capacity(questions.len());
        for question in questions {
            let answers = state.answers.get(&question.id).cloned().unwrap_or_default();
            let total_guesses = answers.iter().map(|row| row.guess_count).sum();
            let correct_guesses = answers
                .iter()
                .find(|row| row.id == question.correct_answer_id)
                .map_or(0, |row| row.guess_count);
            out.push(QuestionStatisticsRow {
                question_id: question.id,
                text: question.text,
                total_guesses,
                correct_guesses,
                correct_answer_id: question.correct_answer_id,
            });
        }
        Ok(out)
    }

    async fn answer_statistics(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerStatisticsRow>, StorageError> {
        let state = self.lock()?;
        let answers = state.answers.get(&question_id).cloned().unwrap_or_default();
        let correct_answer_id = state
            .questions
            .values()
            .flatten()
            .find(|row| row.id == question_id)
            .map(|row| row.correct_answer_id);

        Ok(answers
            .into_iter()
            .map(|row| AnswerStatisticsRow {
                answer_id: row.id,
                text: row.text,
                label: row.label,
                guesses: row.guess_count,
                is_correct: correct_answer_id == Some(row.id),
            })
            .collect())
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn load(&self) -> Result<Option<ProgressSnapshot>, StorageError> {
        let state = self.lock()?;
        let Some(payload) = state.snapshot.as_deref() else {
            return Ok(None);
        };
        match serde_json::from_str(payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                tracing::warn!("discarding unreadable progress snapshot: {err}");
                Ok(None)
            }
        }
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut state = self.lock()?;
        state.snapshot = Some(payload);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.snapshot = None;
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub statistics: Arc<dyn StatisticsRepository>,
    pub progress: Arc<dyn ProgressStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let submissions: Arc<dyn SubmissionRepository> = Arc::new(repo.clone());
        let statistics: Arc<dyn StatisticsRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressStore> = Arc::new(repo);
        Self {
            quizzes,
            submissions,
            statistics,
            progress,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn sample_quiz() -> NewQuizRecord {
        NewQuizRecord {
            title: "Capitals".into(),
            created_at: fixed_now(),
            questions: vec![
                NewQuestionRecord {
                    text: "Capital of France?".into(),
                    kind: QuestionKind::MultipleChoice,
                    answers: vec![
                        "Paris".into(),
                        "Lyon".into(),
                        "Nice".into(),
                        "Lille".into(),
                    ],
                    correct_index: 0,
                },
                NewQuestionRecord {
                    text: "Berlin is in Germany.".into(),
                    kind: QuestionKind::TrueFalse,
                    answers: vec!["True".into(), "False".into()],
                    correct_index: 0,
                },
            ],
        }
    }

    #[tokio::test]
    async fn insert_quiz_assigns_labels_and_correct_ids() {
        let repo = InMemoryRepository::new();
        let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();

        let questions = repo.get_questions(quiz_id).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].position, 0);

        let answers = repo.get_answers(questions[0].id).await.unwrap();
        assert_eq!(answers.len(), 4);
        assert_eq!(answers[0].label, "A");
        assert_eq!(answers[3].label, "D");
        assert_eq!(questions[0].correct_answer_id, answers[0].id);

        let tf_answers = repo.get_answers(questions[1].id).await.unwrap();
        assert_eq!(tf_answers[0].label, "T");
        assert_eq!(tf_answers[1].label, "F");
    }

    #[tokio::test]
    async fn insert_quiz_rejects_bad_correct_index() {
        let repo = InMemoryRepository::new();
        let mut quiz = sample_quiz();
        quiz.questions[1].correct_index = 2;
        let err = repo.insert_quiz(quiz).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn guess_increment_and_statistics() {
        let repo = InMemoryRepository::new();
        let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();
        let questions = repo.get_questions(quiz_id).await.unwrap();
        let answers = repo.get_answers(questions[0].id).await.unwrap();

        repo.increment_guess(answers[0].id).await.unwrap();
        repo.increment_guess(answers[0].id).await.unwrap();
        repo.increment_guess(answers[1].id).await.unwrap();

        let stats = repo.question_statistics(quiz_id).await.unwrap();
        assert_eq!(stats[0].total_guesses, 3);
        assert_eq!(stats[0].correct_guesses, 2);

        let answer_stats = repo.answer_statistics(questions[0].id).await.unwrap();
        assert_eq!(answer_stats[0].guesses, 2);
        assert!(answer_stats[0].is_correct);
        assert!(!answer_stats[1].is_correct);
    }

    #[tokio::test]
    async fn unknown_answer_guess_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.increment_guess(AnswerId::new(999)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn quiz_statistics_aggregate_submissions() {
        let repo = InMemoryRepository::new();
        let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();

        for (correct, user) in [(2, Some("ada")), (1, None)] {
            let submission = Submission::new(
                quiz_id,
                user.map(str::to_string),
                correct,
                2,
                fixed_now(),
            )
            .unwrap();
            repo.append_submission(&submission).await.unwrap();
        }

        let stats = repo.quiz_statistics(quiz_id).await.unwrap();
        assert_eq!(stats.submission_count, 2);
        assert_eq!(stats.question_count, 2);
        assert_eq!(stats.average_percentage, Some(75.0));
        assert_eq!(stats.highest_percentage, Some(100.0));
        assert_eq!(stats.lowest_percentage, Some(50.0));
    }

    #[tokio::test]
    async fn empty_quiz_statistics_have_no_scores() {
        let repo = InMemoryRepository::new();
        let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();
        let stats = repo.quiz_statistics(quiz_id).await.unwrap();
        assert_eq!(stats.submission_count, 0);
        assert_eq!(stats.average_percentage, None);
    }

    #[tokio::test]
    async fn submissions_list_best_first() {
        let repo = InMemoryRepository::new();
        let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();

        for correct in [1, 2, 0] {
            let submission =
                Submission::new(quiz_id, None, correct, 2, fixed_now()).unwrap();
            repo.append_submission(&submission).await.unwrap();
        }

        let rows = repo.list_submissions(quiz_id, 10).await.unwrap();
        let scores: Vec<u32> = rows
            .iter()
            .map(|row| row.submission.correct_count())
            .collect();
        assert_eq!(scores, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn progress_store_round_trips_and_clears() {
        use quiz_core::model::{Question, QuestionKind};

        let repo = InMemoryRepository::new();
        assert!(repo.load().await.unwrap().is_none());

        let snapshot = ProgressSnapshot {
            questions: vec![
                Question::new(
                    "Q",
                    QuestionKind::TrueFalse,
                    vec!["True".into(), "False".into()],
                    0,
                )
                .unwrap(),
            ],
            user_answers: vec![Some(1)],
            current_index: 0,
            timestamp: fixed_now(),
        };
        repo.save(&snapshot).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), Some(snapshot));

        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_snapshot_reads_as_absent() {
        let repo = InMemoryRepository::new();
        repo.state.lock().unwrap().snapshot = Some("{not json".into());
        assert!(repo.load().await.unwrap().is_none());
    }
}
