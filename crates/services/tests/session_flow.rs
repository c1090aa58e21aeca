use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{AnswerId, QuizId, Submission, SubmissionId};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{
    AppServices, ChangeNotifier, SessionError, SessionWorkflow, SubmissionChange,
    SubmissionRecorder,
};
use storage::repository::{
    InMemoryRepository, ProgressStore, StorageError, SubmissionRepository, SubmissionRow,
};

const QUIZ_JSON: &str = r#"[
    {
        "question": "Which planet is red?",
        "answers": ["Venus", "Mars", "Jupiter", "Saturn"],
        "correct_answer": 1
    },
    {
        "question": "Mars has two moons.",
        "answers": ["True", "False"],
        "correct_answer": 0
    }
]"#;

fn workflow_over(repo: &InMemoryRepository) -> SessionWorkflow {
    SessionWorkflow::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        SubmissionRecorder::new(Arc::new(repo.clone()), ChangeNotifier::new()),
    )
}

async fn import_quiz(services: &AppServices) -> QuizId {
    services
        .import()
        .import("Planets", QUIZ_JSON)
        .await
        .unwrap()
}

#[tokio::test]
async fn full_session_flow_feeds_statistics_and_leaderboard() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let mut submission_events = services.notifier().watch_submissions();
    let quiz_id = import_quiz(&services).await;

    let workflow = services.workflow();
    let mut session = workflow.start_session(quiz_id).await.unwrap();

    workflow.select_answer(&mut session, 1).await.unwrap();
    workflow.advance(&mut session).await.unwrap();
    workflow.select_answer(&mut session, 1).await.unwrap();

    let outcome = workflow.finish(&mut session, Some("ada")).await.unwrap();
    assert!(session.is_complete());
    assert_eq!(outcome.report.correct, 1);
    assert_eq!(outcome.report.total, 2);
    assert_eq!(outcome.report.percentage(), 50);
    assert!(outcome.warnings.is_empty());
    assert!(outcome.recording.expect("catalog quiz records").is_complete());
    assert_eq!(
        submission_events.recv().await,
        Some(SubmissionChange::Recorded { quiz_id })
    );

    let stats = services.statistics();
    let quiz_view = stats.quiz_view(quiz_id).await.unwrap();
    assert_eq!(quiz_view.submission_count, 1);
    assert_eq!(quiz_view.average_score, Some(50));
    assert_eq!(quiz_view.question_count, 2);

    let question_views = stats.question_view(quiz_id).await.unwrap();
    assert_eq!(question_views.len(), 2);
    // First question guessed correctly, second guessed wrong.
    assert_eq!(question_views[0].correct_percentage, 100);
    assert_eq!(question_views[1].correct_percentage, 0);

    let board = stats.leaderboard(quiz_id, 10).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].user, "ada");
    assert_eq!(board[0].score_percentage, 50);
}

#[tokio::test]
async fn snapshot_survives_between_sessions_and_dies_on_finish() {
    let repo = InMemoryRepository::new();
    let services_repo = repo.clone();
    let workflow = workflow_over(&services_repo);

    let import = services::QuizImportService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        ChangeNotifier::new(),
    );
    let quiz_id = import.import("Planets", QUIZ_JSON).await.unwrap();

    let mut session = workflow.start_session(quiz_id).await.unwrap();
    workflow.select_answer(&mut session, 1).await.unwrap();
    workflow.advance(&mut session).await.unwrap();
    drop(session);

    // A snapshot is on disk; the page reload equivalent resumes from it.
    assert!(repo.load().await.unwrap().is_some());
    let mut resumed = workflow.start_session(quiz_id).await.unwrap();
    assert_eq!(resumed.current_index(), 1);
    assert_eq!(resumed.user_answers()[0], Some(1));

    workflow.select_answer(&mut resumed, 0).await.unwrap();
    workflow.finish(&mut resumed, None).await.unwrap();
    assert!(repo.load().await.unwrap().is_none());
}

#[tokio::test]
async fn mismatched_snapshot_starts_fresh() {
    let repo = InMemoryRepository::new();
    let workflow = workflow_over(&repo);
    let import = services::QuizImportService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        ChangeNotifier::new(),
    );

    let single = r#"[
        {"question": "Lonely?", "answers": ["True", "False"], "correct_answer": 0}
    ]"#;
    let small_quiz = import.import("Single", single).await.unwrap();
    let big_quiz = import.import("Planets", QUIZ_JSON).await.unwrap();

    let mut session = workflow.start_session(small_quiz).await.unwrap();
    workflow.select_answer(&mut session, 0).await.unwrap();
    drop(session);

    let fresh = workflow.start_session(big_quiz).await.unwrap();
    assert_eq!(fresh.current_index(), 0);
    assert_eq!(fresh.user_answers(), &[None, None]);
}

#[tokio::test]
async fn abandoning_clears_the_snapshot() {
    let repo = InMemoryRepository::new();
    let workflow = workflow_over(&repo);
    let import = services::QuizImportService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        ChangeNotifier::new(),
    );
    let quiz_id = import.import("Planets", QUIZ_JSON).await.unwrap();

    let mut session = workflow.start_session(quiz_id).await.unwrap();
    workflow.select_answer(&mut session, 0).await.unwrap();
    assert!(repo.load().await.unwrap().is_some());

    workflow.abandon(session).await.unwrap();
    assert!(repo.load().await.unwrap().is_none());
}

/// Submission sink that is down; everything else works.
struct DownSubmissions;

#[async_trait::async_trait]
impl SubmissionRepository for DownSubmissions {
    async fn append_submission(
        &self,
        _submission: &Submission,
    ) -> Result<SubmissionId, StorageError> {
        Err(StorageError::Connection("sink unavailable".into()))
    }

    async fn increment_guess(&self, _answer_id: AnswerId) -> Result<(), StorageError> {
        Err(StorageError::Connection("sink unavailable".into()))
    }

    async fn list_submissions(
        &self,
        _quiz_id: QuizId,
        _limit: u32,
    ) -> Result<Vec<SubmissionRow>, StorageError> {
        Err(StorageError::Connection("sink unavailable".into()))
    }
}

#[tokio::test]
async fn recorder_failure_does_not_block_completion() {
    let repo = InMemoryRepository::new();
    let workflow = SessionWorkflow::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        SubmissionRecorder::new(Arc::new(DownSubmissions), ChangeNotifier::new()),
    );
    let import = services::QuizImportService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
        ChangeNotifier::new(),
    );
    let quiz_id = import.import("Planets", QUIZ_JSON).await.unwrap();

    let mut session = workflow.start_session(quiz_id).await.unwrap();
    workflow.select_answer(&mut session, 1).await.unwrap();
    workflow.advance(&mut session).await.unwrap();
    workflow.select_answer(&mut session, 0).await.unwrap();

    let outcome = workflow.finish(&mut session, None).await.unwrap();

    // Local completion and score survive the persistence fault.
    assert!(session.is_complete());
    assert_eq!(outcome.report.correct, 2);
    assert_eq!(outcome.report.percentage(), 100);

    let recording = outcome.recording.expect("recording was attempted");
    assert!(recording.submission.is_err());
    assert!(!outcome.warnings.is_empty());

    // The snapshot is still deleted.
    assert!(repo.load().await.unwrap().is_none());

    // And finishing again is a wrong-phase error, not a double record.
    assert!(matches!(
        workflow.finish(&mut session, None).await,
        Err(SessionError::Completed)
    ));
}

#[tokio::test]
async fn adhoc_sessions_skip_the_recorder() {
    use quiz_core::model::{Question, QuestionKind};

    let repo = InMemoryRepository::new();
    let workflow = workflow_over(&repo);

    let questions = vec![
        Question::new(
            "The sky is blue.",
            QuestionKind::TrueFalse,
            vec!["True".into(), "False".into()],
            0,
        )
        .unwrap(),
    ];
    let mut session = workflow
        .start_adhoc_session(questions, vec![0])
        .await
        .unwrap();

    workflow.select_answer(&mut session, 0).await.unwrap();
    let outcome = workflow.finish(&mut session, None).await.unwrap();

    assert!(session.is_complete());
    assert_eq!(outcome.report.percentage(), 100);
    assert!(outcome.recording.is_none());
}
