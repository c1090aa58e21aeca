mod ids;
mod question;
mod quiz;
mod snapshot;
mod submission;

pub use ids::{AnswerId, ParseIdError, QuestionId, QuizId, SubmissionId};
pub use question::{
    ParseQuestionKindError, Question, QuestionDraft, QuestionError, QuestionKind,
    ValidatedQuestion,
};
pub use quiz::{Quiz, QuizError};
pub use snapshot::ProgressSnapshot;
pub use submission::{Submission, SubmissionError, score_percentage};
