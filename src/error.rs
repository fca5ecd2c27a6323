//! Error types for workout building and session control

use thiserror::Error;

/// Rejected user input for the timer or the exercise count
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid number for {field}")]
    NotANumber { field: &'static str },
    #[error("Work duration must be greater than zero")]
    WorkDuration,
    #[error("Rest duration must not be negative")]
    RestDuration,
    #[error("Number of rounds must be greater than zero")]
    Rounds,
    #[error("Number of exercises must be greater than zero")]
    ExerciseCount,
}

/// Failure to turn exercise slots into a runnable workout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(
        "Exercise {slot}: enter a custom exercise or select at least one of type and body part"
    )]
    EmptySlot { slot: usize },
    #[error("Exercise {slot} could not be found for this combination of type and body part")]
    SelectionMiss { slot: usize },
    #[error("No exercises selected")]
    EmptyWorkout,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("exercise bank unavailable")]
    Bank(#[source] anyhow::Error),
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Build(BuildError::Validation(err))
    }
}

/// Malformed `manual:<name>` / `random:<category>/<body_part>` slot text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("expected `manual:<name>` or `random:<category>/<body part>`, got `{0}`")]
    UnknownKind(String),
    #[error("manual exercise name must not be empty")]
    EmptyName,
}
