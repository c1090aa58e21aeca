use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Question, QuizId, Submission};
use storage::repository::{ProgressStore, QuizRepository};

use super::engine::QuizSession;
use super::plan::SessionPlan;
use super::progress::{ScoreBreakdown, ScoreReport};
use crate::error::SessionError;
use crate::recorder::{RecordOutcome, SubmissionRecorder};

/// What a consumer gets back from `finish`: the local score (always
/// present) and the best-effort recording outcome, when one was attempted.
#[derive(Debug)]
pub struct FinishOutcome {
    pub report: ScoreReport,
    pub breakdown: ScoreBreakdown,
    pub recording: Option<RecordOutcome>,
    pub warnings: Vec<String>,
}

/// Orchestrates session start, persisted progress, and completion.
///
/// Owns the progress store on the engine's behalf: every mutating call
/// writes a fresh snapshot, and completion or abandonment deletes it.
#[derive(Clone)]
pub struct SessionWorkflow {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    progress: Arc<dyn ProgressStore>,
    recorder: SubmissionRecorder,
}

impl SessionWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        progress: Arc<dyn ProgressStore>,
        recorder: SubmissionRecorder,
    ) -> Self {
        Self {
            clock,
            quizzes,
            progress,
            recorder,
        }
    }

    /// Start a session for a catalog quiz, resuming stored progress when it
    /// fits the loaded questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage failures or an unusable plan.
    pub async fn start_session(&self, quiz_id: QuizId) -> Result<QuizSession, SessionError> {
        let questions = self.quizzes.get_questions(quiz_id).await?;
        let mut rows = Vec::with_capacity(questions.len());
        for question in questions {
            let answers = self.quizzes.get_answers(question.id).await?;
            rows.push((question, answers));
        }

        let plan = SessionPlan::from_rows(quiz_id, rows)?;
        let prior = self.load_snapshot().await;
        QuizSession::start(plan, prior, self.clock.now())
    }

    /// Start a session over an ad hoc question set with an explicit answer
    /// key. No durable identity, so finishing will skip the recorder.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Plan` when the inputs do not form a plan.
    pub async fn start_adhoc_session(
        &self,
        questions: Vec<Question>,
        correct: Vec<usize>,
    ) -> Result<QuizSession, SessionError> {
        let plan = SessionPlan::from_questions(questions, correct)?;
        let prior = self.load_snapshot().await;
        QuizSession::start(plan, prior, self.clock.now())
    }

    async fn load_snapshot(&self) -> Option<quiz_core::model::ProgressSnapshot> {
        match self.progress.load().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("progress snapshot unavailable, starting fresh: {err}");
                None
            }
        }
    }

    async fn persist_snapshot(&self, session: &QuizSession) {
        let snapshot = session.snapshot(self.clock.now());
        if let Err(err) = self.progress.save(&snapshot).await {
            tracing::warn!("progress snapshot not saved: {err}");
        }
    }

    /// Record an answer for the current question and persist progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for engine misuse; a snapshot write failure
    /// is only logged.
    pub async fn select_answer(
        &self,
        session: &mut QuizSession,
        index: usize,
    ) -> Result<(), SessionError> {
        session.select_answer(index)?;
        self.persist_snapshot(session).await;
        Ok(())
    }

    /// Move to the next question and persist progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after finish.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.advance()?;
        self.persist_snapshot(session).await;
        Ok(())
    }

    /// Move to the previous question and persist progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after finish.
    pub async fn go_back(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.go_back()?;
        self.persist_snapshot(session).await;
        Ok(())
    }

    /// Complete the session: local score first, then snapshot deletion and
    /// the best-effort hand-off to the recorder.
    ///
    /// The session is `Completed` with a valid score as soon as the engine
    /// transition succeeds; recording and cleanup failures are reported as
    /// warnings, never as errors. The recorder is skipped entirely when the
    /// session has no backing catalog identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` only for engine misuse (wrong phase, current
    /// question unanswered).
    pub async fn finish(
        &self,
        session: &mut QuizSession,
        user_id: Option<&str>,
    ) -> Result<FinishOutcome, SessionError> {
        let now = self.clock.now();
        let report = session.finish(now)?;
        let breakdown = session.score_breakdown();

        let mut warnings = Vec::new();
        if let Err(err) = self.progress.clear().await {
            tracing::warn!("progress snapshot not deleted: {err}");
            warnings.push(format!("progress snapshot not deleted: {err}"));
        }

        let recording = match (session.quiz_id(), session.chosen_answer_ids()) {
            (Some(quiz_id), Some(chosen)) => {
                let submission = Submission::new(
                    quiz_id,
                    user_id.map(str::to_string),
                    report.correct,
                    report.total,
                    now,
                )?;
                let outcome = self.recorder.record(&submission, &chosen).await;
                warnings.extend(outcome.warnings());
                Some(outcome)
            }
            _ => None,
        };

        Ok(FinishOutcome {
            report,
            breakdown,
            recording,
            warnings,
        })
    }

    /// Abandon the session: drop its state and delete the stored snapshot.
    ///
    /// The caller is expected to reload the available-quiz listing
    /// afterwards; that collaborator call is not owned here.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the snapshot cannot be deleted.
    pub async fn abandon(&self, session: QuizSession) -> Result<(), SessionError> {
        drop(session);
        self.progress.clear().await?;
        Ok(())
    }
}
