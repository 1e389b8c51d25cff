use crate::models::assignment_kind::AssignmentKind;
use crate::models::Id;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An assignment was built or updated into a state a teacher must never persist.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Answer kind {answer:?} does not match assignment kind {assignment:?}")]
    KindMismatch {
        assignment: AssignmentKind,
        answer: AssignmentKind,
    },

    #[error("Answer references assignment {found}, expected {expected}")]
    AssignmentMismatch { expected: Id, found: Id },

    #[error("Answer {0} is already graded")]
    AlreadyGraded(Id),

    #[error("Invalid grading transition: {0}")]
    InvalidTransition(String),

    #[error("Score {score} is outside the allowed range 0..={max}")]
    InvalidScore { score: f64, max: f64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors caused by the submitted answer rather than by the engine or its inputs' configuration.
    pub fn is_answer_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAnswer(_)
                | Error::KindMismatch { .. }
                | Error::AssignmentMismatch { .. }
                | Error::AlreadyGraded(_)
        )
    }
}
