#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod import;
pub mod notifier;
pub mod recorder;
pub mod sessions;
pub mod statistics;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, ImportError, PlanError, SessionError, StatisticsError};
pub use import::QuizImportService;
pub use notifier::{
    CatalogChange, CatalogWatch, ChangeNotifier, SubmissionChange, SubmissionWatch,
};
pub use recorder::{GuessOutcome, RecordOutcome, SubmissionRecorder};
pub use sessions::{
    FinishOutcome, KindTally, QuizSession, ScoreBreakdown, ScoreReport, SessionPhase,
    SessionPlan, SessionProgress, SessionWorkflow,
};
pub use statistics::{
    AnswerStatisticsView, LeaderboardEntry, QuestionStatisticsView, QuizStatisticsView,
    StatisticsService,
};
