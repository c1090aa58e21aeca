use std::sync::Arc;

use quiz_core::Clock;
use storage::repository::{QuizRepository, Storage};

use crate::error::AppServicesError;
use crate::import::QuizImportService;
use crate::notifier::ChangeNotifier;
use crate::recorder::SubmissionRecorder;
use crate::sessions::SessionWorkflow;
use crate::statistics::StatisticsService;

/// Assembles app-facing services over one storage backend.
///
/// Owns the single change notifier; the top-level controller owns session
/// lifecycle (create via the workflow, dispose by dropping), so one active
/// session exists per process.
#[derive(Clone)]
pub struct AppServices {
    notifier: ChangeNotifier,
    quizzes: Arc<dyn QuizRepository>,
    workflow: Arc<SessionWorkflow>,
    statistics: Arc<StatisticsService>,
    import: Arc<QuizImportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over the in-memory backend, for tests and demos.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    fn from_storage(storage: Storage, clock: Clock) -> Self {
        let notifier = ChangeNotifier::new();
        let recorder =
            SubmissionRecorder::new(Arc::clone(&storage.submissions), notifier.clone());
        let workflow = Arc::new(SessionWorkflow::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.progress),
            recorder,
        ));
        let statistics = Arc::new(StatisticsService::new(
            Arc::clone(&storage.statistics),
            Arc::clone(&storage.submissions),
        ));
        let import = Arc::new(QuizImportService::new(
            clock,
            Arc::clone(&storage.quizzes),
            notifier.clone(),
        ));

        Self {
            notifier,
            quizzes: storage.quizzes,
            workflow,
            statistics,
            import,
        }
    }

    #[must_use]
    pub fn notifier(&self) -> ChangeNotifier {
        self.notifier.clone()
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<dyn QuizRepository> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn workflow(&self) -> Arc<SessionWorkflow> {
        Arc::clone(&self.workflow)
    }

    #[must_use]
    pub fn statistics(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.statistics)
    }

    #[must_use]
    pub fn import(&self) -> Arc<QuizImportService> {
        Arc::clone(&self.import)
    }
}
