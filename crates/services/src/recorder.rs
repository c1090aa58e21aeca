use std::sync::Arc;

use quiz_core::model::{AnswerId, Submission, SubmissionId};
use storage::repository::{StorageError, SubmissionRepository};

use crate::notifier::{ChangeNotifier, SubmissionChange};

/// Outcome of one guess-counter increment.
#[derive(Debug)]
pub struct GuessOutcome {
    pub answer_id: AnswerId,
    pub result: Result<(), StorageError>,
}

/// Outcome of a recording attempt: one `Result` per write, no rollback.
///
/// The submission insert and the guess-counter increments are not
/// transactional with each other; a partial outcome stays partial and is
/// surfaced as warnings rather than undone.
#[derive(Debug)]
pub struct RecordOutcome {
    pub submission: Result<SubmissionId, StorageError>,
    pub guesses: Vec<GuessOutcome>,
}

impl RecordOutcome {
    /// True when every write landed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.submission.is_ok() && self.guesses.iter().all(|guess| guess.result.is_ok())
    }

    /// Human-readable warnings for the writes that failed.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Err(err) = &self.submission {
            out.push(format!("submission was not recorded: {err}"));
        }
        for guess in &self.guesses {
            if let Err(err) = &guess.result {
                out.push(format!(
                    "guess counter for answer {} not updated: {err}",
                    guess.answer_id
                ));
            }
        }
        out
    }
}

/// Writes one immutable submission record and bumps per-answer guess
/// counters, best effort.
///
/// Semantics are at-least-once: a retry after a partial failure may
/// double-count guesses, which is accepted rather than guarded against.
#[derive(Clone)]
pub struct SubmissionRecorder {
    submissions: Arc<dyn SubmissionRepository>,
    notifier: ChangeNotifier,
}

impl SubmissionRecorder {
    #[must_use]
    pub fn new(submissions: Arc<dyn SubmissionRepository>, notifier: ChangeNotifier) -> Self {
        Self {
            submissions,
            notifier,
        }
    }

    /// Record a completed session.
    ///
    /// Never fails as a whole: each write's result is reported in the
    /// returned outcome, failures are logged, and a successful insert is
    /// published to the submission change stream.
    pub async fn record(&self, submission: &Submission, chosen: &[AnswerId]) -> RecordOutcome {
        let inserted = self.submissions.append_submission(submission).await;
        match &inserted {
            Ok(id) => {
                tracing::debug!(
                    "recorded submission {id} for quiz {}",
                    submission.quiz_id()
                );
                self.notifier.publish_submission(SubmissionChange::Recorded {
                    quiz_id: submission.quiz_id(),
                });
            }
            Err(err) => {
                tracing::warn!("submission insert failed: {err}");
            }
        }

        let mut guesses = Vec::with_capacity(chosen.len());
        for answer_id in chosen {
            let result = self.submissions.increment_guess(*answer_id).await;
            if let Err(err) = &result {
                tracing::warn!("guess counter for answer {answer_id} not updated: {err}");
            }
            guesses.push(GuessOutcome {
                answer_id: *answer_id,
                result,
            });
        }

        RecordOutcome {
            submission: inserted,
            guesses,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
