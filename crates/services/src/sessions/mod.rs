mod engine;
mod plan;
mod progress;
mod workflow;

pub use engine::{QuizSession, SessionPhase};
pub use plan::SessionPlan;
pub use progress::{KindTally, ScoreBreakdown, ScoreReport, SessionProgress};
pub use workflow::{FinishOutcome, SessionWorkflow};
