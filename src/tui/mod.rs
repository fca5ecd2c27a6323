//! TUI module - Run view of a workout with ratatui

use std::io::{Stdout, stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::timer::{
    Phase, RunEvent, RunOutcome, Tick, TickSink, TimerClock, TokioScheduler, WorkoutRun, drive,
    format_clock,
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the run view shows, updated on every tick
#[derive(Debug, Clone, Default, PartialEq)]
struct Snapshot {
    round: u32,
    phase: Option<Phase>,
    exercise: String,
    remaining: u32,
    step_progress: f64,
    overall_progress: f64,
    complete: bool,
}

/// Tick sink that redraws the run view on every frame
pub struct RunView<B: Backend> {
    terminal: Terminal<B>,
    snapshot: Snapshot,
}

impl<B: Backend> RunView<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            snapshot: Snapshot::default(),
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn redraw(&mut self) {
        let snapshot = &self.snapshot;
        if let Err(e) = self.terminal.draw(|frame| render(frame, snapshot)) {
            warn!("failed to draw run view: {}", e);
        }
    }
}

impl<B: Backend> TickSink for RunView<B> {
    fn on_tick(&mut self, tick: &Tick<'_>) {
        self.snapshot = Snapshot {
            round: tick.round,
            phase: Some(tick.phase),
            exercise: tick.exercise.name.clone(),
            remaining: tick.remaining,
            step_progress: tick.step_progress(),
            overall_progress: tick.overall_progress,
            complete: false,
        };
        self.redraw();
    }

    fn on_complete(&mut self) {
        self.snapshot.complete = true;
        self.snapshot.step_progress = 1.0;
        self.snapshot.overall_progress = 1.0;
        self.redraw();
    }
}

fn render(frame: &mut Frame, snapshot: &Snapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(format!("circuitgen - Round {}", snapshot.round))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let (status, color) = match (snapshot.complete, snapshot.phase) {
        (true, _) => ("🎉 Workout Complete! Great job! 💪".to_string(), Color::Green),
        (false, Some(Phase::Work)) => (
            format!("{} Exercise: {}", Phase::Work.emoji(), snapshot.exercise),
            Color::Yellow,
        ),
        (false, Some(Phase::Rest)) => (format!("{} Rest Time", Phase::Rest.emoji()), Color::Blue),
        (false, None) => ("Get ready".to_string(), Color::Gray),
    };
    let status = Paragraph::new(format!("{}  {}", status, format_clock(snapshot.remaining)))
        .style(Style::default().fg(color).bold())
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[1]);

    let step_title = snapshot.phase.map_or("Step", |phase| phase.label());
    frame.render_widget(gauge(step_title, snapshot.step_progress, color), chunks[2]);
    frame.render_widget(gauge("Workout", snapshot.overall_progress, Color::Cyan), chunks[3]);

    let footer = Paragraph::new("p: pause/resume | q: quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[5]);
}

fn gauge(title: &str, progress: f64, color: Color) -> Gauge<'static> {
    let ratio = progress.clamp(0.0, 1.0);
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0))
}

/// Map a key press during a run to an event
pub fn command_for(key: KeyEvent) -> Option<RunEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(RunEvent::TogglePause),
        KeyCode::Char('q') | KeyCode::Esc => Some(RunEvent::Cancel),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(RunEvent::Cancel)
        }
        _ => None,
    }
}

/// Forward key presses to the run loop until `stop` is set or the loop is gone
fn forward_keys(tx: mpsc::UnboundedSender<RunEvent>, stop: Arc<AtomicBool>) -> Result<()> {
    while !stop.load(Ordering::Relaxed) {
        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
        {
            match command_for(key) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => debug!(code = ?key.code, "ignored key"),
            }
        }
    }
    Ok(())
}

/// Run the workout full screen; `p` pauses/resumes, `q` quits
pub async fn run_in_terminal(clock: TimerClock) -> Result<RunOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut run = WorkoutRun::new(clock, TokioScheduler::new(tx.clone()));

    let stop = Arc::new(AtomicBool::new(false));
    let input = tokio::task::spawn_blocking({
        let stop = Arc::clone(&stop);
        move || forward_keys(tx, stop)
    });

    let mut view = RunView::new(init_terminal()?);
    let outcome = drive(&mut run, &mut rx, &mut view).await;
    drop(run);
    if outcome == RunOutcome::Completed {
        // Leave the final screen up until a key is pressed
        rx.recv().await;
    }

    stop.store(true, Ordering::Relaxed);
    drop(rx);
    restore_terminal()?;
    if let Err(e) = input.await? {
        warn!("keyboard input stopped: {}", e);
    }

    match outcome {
        RunOutcome::Completed => println!("🎉 Workout Complete! Great job! 💪"),
        RunOutcome::Cancelled => println!("Workout stopped."),
    }
    Ok(outcome)
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
