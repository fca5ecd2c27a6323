//! circuitgen - Circuit workout builder
//!
//! Pick exercises by hand or at random from a categorized bank, set a
//! work/rest/rounds schedule and count it down phase by phase.

pub mod error;
pub mod exercises;
pub mod selector;
pub mod session;
pub mod storage;
pub mod timer;
pub mod tui;
pub mod workout;

pub use error::{BuildError, SessionError, ValidationError};
pub use selector::ExerciseSelector;
pub use session::{AppState, Session};
pub use storage::Storage;
