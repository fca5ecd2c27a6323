//! Per-second countdown through the sequenced steps, with pause/resume and cancel

use tracing::{debug, info};

use super::sequencer::{Phase, PhaseSequencer, PhaseStep};
use crate::error::BuildError;
use crate::exercises::Exercise;
use crate::workout::TimerConfig;

/// What the presentation layer gets on every tick and on every step entry
#[derive(Debug, Clone)]
pub struct Tick<'a> {
    pub round: u32,
    pub phase: Phase,
    pub exercise: &'a Exercise,
    pub remaining: u32,
    pub elapsed: u32,
    pub total_for_step: u32,
    pub overall_progress: f64,
}

impl Tick<'_> {
    /// Progress through the current step, in `0.0..=1.0`
    pub fn step_progress(&self) -> f64 {
        if self.total_for_step == 0 {
            return 1.0;
        }
        f64::from(self.elapsed) / f64::from(self.total_for_step)
    }
}

pub trait TickSink {
    fn on_tick(&mut self, tick: &Tick<'_>);

    fn on_complete(&mut self) {}
}

impl<F> TickSink for F
where
    F: FnMut(&Tick<'_>),
{
    fn on_tick(&mut self, tick: &Tick<'_>) {
        self(tick)
    }
}

/// Mutable state of an active run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRunState {
    pub current_step_cursor: usize,
    pub remaining_in_step: u32,
    pub elapsed_in_step: u32,
    /// Steps fully counted down
    pub total_elapsed_steps: usize,
    pub paused: bool,
    /// A tick fired while paused and waits for resume
    pub deferred_tick: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

/// Result of a pause toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseToggle {
    Paused,
    /// `fire_deferred` is set when a tick was held back and must run now
    Resumed { fire_deferred: bool },
    /// Nothing to pause (not started, finished or cancelled)
    Ignored,
}

pub struct TimerClock {
    exercises: Vec<Exercise>,
    sequencer: PhaseSequencer,
    state: Option<TimerRunState>,
    status: ClockStatus,
}

impl TimerClock {
    pub fn new(exercises: Vec<Exercise>, config: &TimerConfig) -> Result<Self, BuildError> {
        let sequencer = PhaseSequencer::new(exercises.len(), config)?;
        Ok(Self {
            exercises,
            sequencer,
            state: None,
            status: ClockStatus::Idle,
        })
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    pub fn state(&self) -> Option<&TimerRunState> {
        self.state.as_ref()
    }

    pub fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn is_paused(&self) -> bool {
        self.status == ClockStatus::Paused
    }

    /// Enter the first step and report its starting frame
    pub fn start(&mut self, sink: &mut impl TickSink) -> ClockStatus {
        if self.status != ClockStatus::Idle {
            return self.status;
        }
        info!(
            exercises = self.exercises.len(),
            total_seconds = self.sequencer.total_seconds(),
            "workout started"
        );
        self.enter_next_step(sink, 0)
    }

    /// One second of wall time.
    ///
    /// While paused the tick is held back without touching the counters.
    pub fn tick(&mut self, sink: &mut impl TickSink) -> ClockStatus {
        match self.status {
            ClockStatus::Running => {}
            ClockStatus::Paused => {
                if let Some(state) = self.state.as_mut() {
                    state.deferred_tick = true;
                }
                return self.status;
            }
            ClockStatus::Idle | ClockStatus::Completed | ClockStatus::Cancelled => {
                return self.status;
            }
        }

        let Some(state) = self.state.as_mut() else {
            return self.status;
        };
        state.remaining_in_step = state.remaining_in_step.saturating_sub(1);
        state.elapsed_in_step += 1;
        let finished_step = state.remaining_in_step == 0;
        let done_steps = state.total_elapsed_steps + usize::from(finished_step);

        self.emit(sink);

        if finished_step {
            self.enter_next_step(sink, done_steps)
        } else {
            self.status
        }
    }

    pub fn toggle_pause(&mut self) -> PauseToggle {
        let Some(state) = self.state.as_mut() else {
            return PauseToggle::Ignored;
        };

        match self.status {
            ClockStatus::Running => {
                state.paused = true;
                self.status = ClockStatus::Paused;
                info!(remaining = state.remaining_in_step, "timer paused");
                PauseToggle::Paused
            }
            ClockStatus::Paused => {
                state.paused = false;
                let fire_deferred = std::mem::take(&mut state.deferred_tick);
                self.status = ClockStatus::Running;
                info!(remaining = state.remaining_in_step, fire_deferred, "timer resumed");
                PauseToggle::Resumed { fire_deferred }
            }
            ClockStatus::Idle | ClockStatus::Completed | ClockStatus::Cancelled => {
                PauseToggle::Ignored
            }
        }
    }

    /// Drop the run state; later ticks are ignored
    pub fn cancel(&mut self) {
        if matches!(self.status, ClockStatus::Completed | ClockStatus::Cancelled) {
            return;
        }
        self.state = None;
        self.status = ClockStatus::Cancelled;
        info!("workout cancelled");
    }

    pub fn current_step(&self) -> Option<&PhaseStep> {
        self.sequencer.current()
    }

    fn enter_next_step(&mut self, sink: &mut impl TickSink, done_steps: usize) -> ClockStatus {
        let Some(step) = self.sequencer.advance().copied() else {
            if let Some(state) = self.state.as_mut() {
                state.total_elapsed_steps = done_steps;
            }
            self.status = ClockStatus::Completed;
            info!(steps = done_steps, "workout complete");
            sink.on_complete();
            return self.status;
        };

        debug!(
            round = step.round,
            exercise = step.exercise_index,
            phase = step.phase.label(),
            duration = step.duration,
            "step entered"
        );

        let paused = self.state.as_ref().is_some_and(|s| s.paused);
        self.state = Some(TimerRunState {
            current_step_cursor: self.sequencer.position().unwrap_or_default(),
            remaining_in_step: step.duration,
            elapsed_in_step: 0,
            total_elapsed_steps: done_steps,
            paused,
            deferred_tick: false,
        });
        self.status = ClockStatus::Running;
        self.emit(sink);
        self.status
    }

    fn emit(&self, sink: &mut impl TickSink) {
        let (Some(state), Some(step)) = (self.state.as_ref(), self.sequencer.current()) else {
            return;
        };
        let Some(exercise) = self.exercises.get(step.exercise_index) else {
            return;
        };
        sink.on_tick(&Tick {
            round: step.round,
            phase: step.phase,
            exercise,
            remaining: state.remaining_in_step,
            elapsed: state.elapsed_in_step,
            total_for_step: step.duration,
            overall_progress: self.sequencer.progress(),
        });
    }
}

/// Format seconds as `MM:SS`
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
