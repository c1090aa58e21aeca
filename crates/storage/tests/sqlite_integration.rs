use quiz_core::model::{ProgressSnapshot, Question, QuestionKind, QuizId, Submission};
use quiz_core::time::fixed_now;
use storage::repository::{
    NewQuestionRecord, NewQuizRecord, ProgressStore, QuizRepository, StatisticsRepository,
    StorageError, SubmissionRepository,
};
use storage::sqlite::SqliteRepository;

fn sample_quiz() -> NewQuizRecord {
    NewQuizRecord {
        title: "Geography".into(),
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
                text: "The Nile is in Africa.".into(),
                kind: QuestionKind::TrueFalse,
                answers: vec!["True".into(), "False".into()],
                correct_index: 0,
            },
        ],
    }
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_quiz_questions_and_answers() {
    let repo = connect("memdb_quiz_roundtrip").await;

    let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();

    let quiz = repo.get_quiz(quiz_id).await.unwrap().expect("quiz exists");
    assert_eq!(quiz.title(), "Geography");
    assert_eq!(quiz.question_count(), 2);

    let questions = repo.get_questions(quiz_id).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].position, 0);
    assert_eq!(questions[0].kind, QuestionKind::MultipleChoice);
    assert_eq!(questions[1].kind, QuestionKind::TrueFalse);

    let answers = repo.get_answers(questions[0].id).await.unwrap();
    let labels: Vec<&str> = answers.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C", "D"]);
    assert_eq!(questions[0].correct_answer_id, answers[0].id);

    let tf_answers = repo.get_answers(questions[1].id).await.unwrap();
    let tf_labels: Vec<&str> = tf_answers.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(tf_labels, vec!["T", "F"]);
}

#[tokio::test]
async fn sqlite_lists_quizzes_newest_first() {
    let repo = connect("memdb_quiz_listing").await;

    let mut older = sample_quiz();
    older.created_at = fixed_now() - chrono::Duration::days(1);
    repo.insert_quiz(older).await.unwrap();

    let mut newer = sample_quiz();
    newer.title = "Newer".into();
    repo.insert_quiz(newer).await.unwrap();

    let listed = repo.list_quizzes(10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title(), "Newer");

    assert!(repo.get_quiz(QuizId::new(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_counts_guesses_and_aggregates_statistics() {
    let repo = connect("memdb_statistics").await;
    let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();
    let questions = repo.get_questions(quiz_id).await.unwrap();
    let answers = repo.get_answers(questions[0].id).await.unwrap();

    repo.increment_guess(answers[0].id).await.unwrap();
    repo.increment_guess(answers[0].id).await.unwrap();
    repo.increment_guess(answers[2].id).await.unwrap();

    for (correct, user) in [(2_u32, Some("ada")), (1, None)] {
        let submission =
            Submission::new(quiz_id, user.map(str::to_string), correct, 2, fixed_now()).unwrap();
        repo.append_submission(&submission).await.unwrap();
    }

    let quiz_stats = repo.quiz_statistics(quiz_id).await.unwrap();
    assert_eq!(quiz_stats.submission_count, 2);
    assert_eq!(quiz_stats.question_count, 2);
    assert_eq!(quiz_stats.average_percentage, Some(75.0));
    assert_eq!(quiz_stats.highest_percentage, Some(100.0));
    assert_eq!(quiz_stats.lowest_percentage, Some(50.0));

    let question_stats = repo.question_statistics(quiz_id).await.unwrap();
    assert_eq!(question_stats[0].total_guesses, 3);
    assert_eq!(question_stats[0].correct_guesses, 2);
    assert_eq!(question_stats[0].correct_answer_id, answers[0].id);
    assert_eq!(question_stats[1].total_guesses, 0);

    let answer_stats = repo.answer_statistics(questions[0].id).await.unwrap();
    assert_eq!(answer_stats[0].guesses, 2);
    assert!(answer_stats[0].is_correct);
    assert_eq!(answer_stats[2].guesses, 1);
    assert!(!answer_stats[2].is_correct);
}

#[tokio::test]
async fn sqlite_statistics_for_unknown_quiz_is_not_found() {
    let repo = connect("memdb_unknown_quiz").await;
    let err = repo.quiz_statistics(QuizId::new(42)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_orders_leaderboard_by_score() {
    let repo = connect("memdb_leaderboard").await;
    let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();

    for correct in [0_u32, 2, 1] {
        let submission = Submission::new(quiz_id, None, correct, 2, fixed_now()).unwrap();
        repo.append_submission(&submission).await.unwrap();
    }

    let rows = repo.list_submissions(quiz_id, 2).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].submission.correct_count(), 2);
    assert_eq!(rows[0].submission.score_percentage(), 100);
    assert_eq!(rows[1].submission.correct_count(), 1);
}

#[tokio::test]
async fn sqlite_progress_store_round_trips() {
    let repo = connect("memdb_progress").await;
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
        user_answers: vec![Some(0)],
        current_index: 0,
        timestamp: fixed_now(),
    };

    repo.save(&snapshot).await.unwrap();
    assert_eq!(repo.load().await.unwrap(), Some(snapshot.clone()));

    // Saving again overwrites the single slot rather than growing it.
    repo.save(&snapshot).await.unwrap();
    assert_eq!(repo.load().await.unwrap(), Some(snapshot));

    repo.clear().await.unwrap();
    assert!(repo.load().await.unwrap().is_none());

    // Clearing an already-empty slot is not an error.
    repo.clear().await.unwrap();
}

#[tokio::test]
async fn sqlite_corrupt_progress_payload_reads_as_absent() {
    let repo = connect("memdb_progress_corrupt").await;

    sqlx::query(
        "INSERT INTO session_progress (id, payload, updated_at) VALUES (1, '{broken', ?1)",
    )
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    assert!(repo.load().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_deleting_quiz_cascades() {
    let repo = connect("memdb_cascade").await;
    let quiz_id = repo.insert_quiz(sample_quiz()).await.unwrap();
    let questions = repo.get_questions(quiz_id).await.unwrap();

    repo.delete_quiz(quiz_id).await.unwrap();
    assert!(repo.get_quiz(quiz_id).await.unwrap().is_none());
    assert!(repo.get_questions(quiz_id).await.unwrap().is_empty());
    assert!(repo.get_answers(questions[0].id).await.unwrap().is_empty());

    let err = repo.delete_quiz(quiz_id).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
