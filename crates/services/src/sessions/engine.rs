use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{AnswerId, ProgressSnapshot, Question, QuestionKind, QuizId};

use super::plan::SessionPlan;
use super::progress::{ScoreBreakdown, ScoreReport, SessionProgress};
use crate::error::SessionError;

/// Lifecycle phase of a session instance.
///
/// A session instance exists only once started, so a fresh instance begins
/// `InProgress`; `Completed` is terminal, and a new attempt needs a new
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state machine for one quiz attempt.
///
/// Steps through the plan's questions, recording one answer slot per
/// question (last write wins), and computes the score on finish. All
/// mutating calls after completion fail loudly except the navigation
/// no-ops documented on `advance`/`go_back`.
pub struct QuizSession {
    plan: SessionPlan,
    user_answers: Vec<Option<usize>>,
    current: usize,
    phase: SessionPhase,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over `plan`, resuming from `prior` when it fits.
    ///
    /// A snapshot resumes the answer slots and position only when its
    /// question count matches the plan and it is internally consistent;
    /// anything else is silently discarded and the session starts fresh.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Plan` if the plan is empty.
    pub fn start(
        plan: SessionPlan,
        prior: Option<ProgressSnapshot>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if plan.is_empty() {
            return Err(crate::error::PlanError::Empty.into());
        }

        let (user_answers, current) = match prior {
            Some(snapshot)
                if snapshot.matches(plan.questions())
                    && snapshot.is_well_formed()
                    && snapshot
                        .user_answers
                        .iter()
                        .zip(plan.questions())
                        .all(|(answer, question)| {
                            answer.is_none_or(|index| index < question.answer_count())
                        }) =>
            {
                (snapshot.user_answers, snapshot.current_index)
            }
            _ => (vec![None; plan.len()], 0),
        };

        Ok(Self {
            plan,
            user_answers,
            current,
            phase: SessionPhase::InProgress,
            started_at,
            completed_at: None,
        })
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn quiz_id(&self) -> Option<QuizId> {
        self.plan.quiz_id()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.plan.questions()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.plan.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.plan.questions()[self.current]
    }

    #[must_use]
    pub fn user_answers(&self) -> &[Option<usize>] {
        &self.user_answers
    }

    #[must_use]
    pub fn is_first_question(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.plan.len()
    }

    #[must_use]
    pub fn has_answered_current(&self) -> bool {
        self.user_answers[self.current].is_some()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    /// Fraction of the quiz reached, `(current + 1) / total`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f64 {
        (self.current + 1) as f64 / self.plan.len() as f64
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.plan.len(),
            answered: self.user_answers.iter().flatten().count(),
            current: self.current,
            is_first: self.is_first_question(),
            is_last: self.is_last_question(),
            is_complete: self.is_complete(),
        }
    }

    /// Number of questions answered correctly so far.
    #[must_use]
    pub fn score(&self) -> u32 {
        let matches = self
            .user_answers
            .iter()
            .zip(self.plan.correct())
            .filter(|(answer, correct)| **answer == Some(**correct))
            .count();
        u32::try_from(matches).unwrap_or(u32::MAX)
    }

    /// Rounded percentage form of [`score`](Self::score).
    #[must_use]
    pub fn score_percentage(&self) -> u32 {
        let total = u32::try_from(self.plan.len()).unwrap_or(u32::MAX);
        quiz_core::model::score_percentage(self.score(), total)
    }

    /// Correct/total tallies split by question kind.
    #[must_use]
    pub fn score_breakdown(&self) -> ScoreBreakdown {
        let mut breakdown = ScoreBreakdown::default();
        for ((question, answer), correct) in self
            .plan
            .questions()
            .iter()
            .zip(&self.user_answers)
            .zip(self.plan.correct())
        {
            let tally = match question.kind() {
                QuestionKind::MultipleChoice => &mut breakdown.multiple_choice,
                QuestionKind::TrueFalse => &mut breakdown.true_false,
            };
            tally.total += 1;
            if *answer == Some(*correct) {
                tally.correct += 1;
            }
        }
        breakdown
    }

    /// Durable identities of every chosen answer, in question order.
    ///
    /// `None` when the plan has no backing catalog identity; unanswered
    /// questions contribute nothing.
    #[must_use]
    pub fn chosen_answer_ids(&self) -> Option<Vec<AnswerId>> {
        let answer_ids = self.plan.answer_ids()?;
        Some(
            self.user_answers
                .iter()
                .zip(answer_ids)
                .filter_map(|(answer, ids)| answer.map(|index| ids[index]))
                .collect(),
        )
    }

    /// Durable image of the in-flight state for the progress store.
    #[must_use]
    pub fn snapshot(&self, at: DateTime<Utc>) -> ProgressSnapshot {
        ProgressSnapshot {
            questions: self.plan.questions().to_vec(),
            user_answers: self.user_answers.clone(),
            current_index: self.current,
            timestamp: at,
        }
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Record `index` as the answer to the current question.
    ///
    /// Re-selecting overwrites the previous choice; no history is kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after finish, or
    /// `SessionError::AnswerOutOfRange` for an index the current question
    /// does not have.
    pub fn select_answer(&mut self, index: usize) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let len = self.current_question().answer_count();
        if index >= len {
            return Err(SessionError::AnswerOutOfRange { index, len });
        }
        self.user_answers[self.current] = Some(index);
        Ok(())
    }

    /// Move to the next question; a no-op at the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after finish.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.current + 1 < self.plan.len() {
            self.current += 1;
        }
        Ok(())
    }

    /// Move to the previous question; a no-op at the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after finish.
    pub fn go_back(&mut self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    /// Complete the session and compute the final score.
    ///
    /// The current question must be answered; completion is local and
    /// immediate, regardless of what happens to any later recording.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` on a second call, or
    /// `SessionError::CurrentUnanswered` when the current question has no
    /// selection yet.
    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<ScoreReport, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if !self.has_answered_current() {
            return Err(SessionError::CurrentUnanswered);
        }

        self.phase = SessionPhase::Completed;
        self.completed_at = Some(at);

        Ok(ScoreReport {
            correct: self.score(),
            total: u32::try_from(self.plan.len()).unwrap_or(u32::MAX),
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.plan.quiz_id())
            .field("questions_len", &self.plan.len())
            .field("current", &self.current)
            .field("phase", &self.phase)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
