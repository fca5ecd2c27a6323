//! Expands a workout into its ordered WORK/REST steps and tracks a cursor through them

use tracing::debug;

use crate::error::BuildError;
use crate::workout::TimerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Work,
    Rest,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "WORKING",
            Phase::Rest => "RESTING",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Phase::Work => "🚀",
            Phase::Rest => "😌",
        }
    }
}

/// One (round, exercise, phase) unit of the workout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStep {
    /// 1-based
    pub round: u32,
    pub exercise_index: usize,
    pub phase: Phase,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    NotStarted,
    At(usize),
    Finished,
}

/// Deterministic step order for a fixed exercise count and timer config.
///
/// Every round walks the exercises in order; each exercise gets a WORK step
/// followed by a REST step when rest is non-zero. `step_count` accumulates
/// the duration of each step as it is entered, so overall progress reaches
/// 1.0 on entering the final step.
#[derive(Debug, Clone)]
pub struct PhaseSequencer {
    steps: Vec<PhaseStep>,
    cursor: Cursor,
    step_count: u64,
    total_seconds: u64,
}

impl PhaseSequencer {
    pub fn new(exercise_count: usize, config: &TimerConfig) -> Result<Self, BuildError> {
        if exercise_count == 0 {
            return Err(BuildError::EmptyWorkout);
        }

        let work = config.work_duration();
        let rest = config.rest_duration();
        let mut steps = Vec::with_capacity(exercise_count * config.rounds() as usize * 2);

        for round in 1..=config.rounds() {
            for exercise_index in 0..exercise_count {
                steps.push(PhaseStep {
                    round,
                    exercise_index,
                    phase: Phase::Work,
                    duration: work,
                });
                if rest > 0 {
                    steps.push(PhaseStep {
                        round,
                        exercise_index,
                        phase: Phase::Rest,
                        duration: rest,
                    });
                }
            }
        }

        let total_seconds = config.total_seconds(exercise_count);
        debug!(steps = steps.len(), total_seconds, "workout sequenced");

        Ok(Self {
            steps,
            cursor: Cursor::NotStarted,
            step_count: 0,
            total_seconds,
        })
    }

    pub fn steps(&self) -> &[PhaseStep] {
        &self.steps
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    /// Seconds of all steps entered so far, including the current one
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Fraction of the workout covered by entered steps, in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 1.0;
        }
        (self.step_count as f64 / self.total_seconds as f64).min(1.0)
    }

    pub fn current(&self) -> Option<&PhaseStep> {
        match self.cursor {
            Cursor::At(index) => self.steps.get(index),
            Cursor::NotStarted | Cursor::Finished => None,
        }
    }

    /// Index of the current step, if one is active
    pub fn position(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(index) => Some(index),
            Cursor::NotStarted | Cursor::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == Cursor::Finished
    }

    /// Enter the next step, or return `None` once the last one is done
    pub fn advance(&mut self) -> Option<&PhaseStep> {
        let next = match self.cursor {
            Cursor::NotStarted => 0,
            Cursor::At(index) => index + 1,
            Cursor::Finished => return None,
        };

        match self.steps.get(next) {
            Some(step) => {
                self.step_count += u64::from(step.duration);
                self.cursor = Cursor::At(next);
                Some(step)
            }
            None => {
                self.cursor = Cursor::Finished;
                None
            }
        }
    }
}
