//! Timer module - turns a built workout into a paced countdown
//!
//! - `sequencer`: ordered WORK/REST steps across rounds
//! - `clock`: per-second countdown with pause/resume
//! - `scheduler`: one outstanding tick at a time, tokio-backed driver

pub mod clock;
pub mod scheduler;
pub mod sequencer;

pub use clock::{ClockStatus, PauseToggle, Tick, TickSink, TimerClock, TimerRunState, format_clock};
pub use scheduler::{RunEvent, RunOutcome, Scheduler, TokioScheduler, WorkoutRun, drive};
pub use sequencer::{Phase, PhaseSequencer, PhaseStep};
