//! One-tick-at-a-time scheduling and the async loop that drives a run

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::clock::{ClockStatus, PauseToggle, TickSink, TimerClock};

/// Wall-clock delay between ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Inputs to a running workout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Tick,
    TogglePause,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Something that can fire a single deferred tick
pub trait Scheduler {
    /// Request a tick after `delay`, replacing any pending one
    fn schedule(&mut self, delay: Duration);

    /// Release the pending tick, if any
    fn cancel(&mut self);
}

/// Sleeps on the tokio timer and delivers [`RunEvent::Tick`] over a channel
pub struct TokioScheduler {
    events: mpsc::UnboundedSender<RunEvent>,
    pending: Option<JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(events: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self {
            events,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) {
        self.cancel();
        let events = self.events.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the run is over
            let _ = events.send(RunEvent::Tick);
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A timer clock wired to a scheduler
pub struct WorkoutRun<S> {
    clock: TimerClock,
    scheduler: S,
}

impl<S: Scheduler> WorkoutRun<S> {
    pub fn new(clock: TimerClock, scheduler: S) -> Self {
        Self { clock, scheduler }
    }

    pub fn clock(&self) -> &TimerClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn start(&mut self, sink: &mut impl TickSink) -> ClockStatus {
        let status = self.clock.start(sink);
        self.follow_up(status)
    }

    pub fn on_tick(&mut self, sink: &mut impl TickSink) -> ClockStatus {
        let status = self.clock.tick(sink);
        self.follow_up(status)
    }

    /// Pause or resume; a tick held back during the pause fires immediately
    pub fn toggle_pause(&mut self, sink: &mut impl TickSink) -> ClockStatus {
        match self.clock.toggle_pause() {
            PauseToggle::Resumed {
                fire_deferred: true,
            } => self.on_tick(sink),
            PauseToggle::Paused | PauseToggle::Resumed { .. } | PauseToggle::Ignored => {
                self.clock.status()
            }
        }
    }

    pub fn cancel(&mut self) {
        self.scheduler.cancel();
        self.clock.cancel();
    }

    pub fn into_clock(self) -> TimerClock {
        self.clock
    }

    fn follow_up(&mut self, status: ClockStatus) -> ClockStatus {
        if status == ClockStatus::Running {
            self.scheduler.schedule(TICK_INTERVAL);
        }
        status
    }
}

/// Run the workout until it completes or is cancelled.
///
/// A closed event channel counts as cancellation.
pub async fn drive<S: Scheduler>(
    run: &mut WorkoutRun<S>,
    events: &mut mpsc::UnboundedReceiver<RunEvent>,
    sink: &mut impl TickSink,
) -> RunOutcome {
    let mut status = run.start(sink);

    loop {
        if status == ClockStatus::Completed {
            return RunOutcome::Completed;
        }

        let Some(event) = events.recv().await else {
            run.cancel();
            return RunOutcome::Cancelled;
        };
        debug!(?event, "run event");

        status = match event {
            RunEvent::Tick => run.on_tick(sink),
            RunEvent::TogglePause => run.toggle_pause(sink),
            RunEvent::Cancel => {
                run.cancel();
                return RunOutcome::Cancelled;
            }
        };
    }
}
