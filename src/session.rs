//! Session state machine - which step of building or running a workout the user is on

use rand::Rng;
use rand::rngs::StdRng;
use tracing::info;

use crate::error::{BuildError, SessionError};
use crate::exercises::{BankSource, Exercise};
use crate::selector::ExerciseSelector;
use crate::timer::TimerClock;
use crate::workout::{self, Preview, SlotChoice, TimerConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Main menu
    Loading,
    /// Choosing the bank, the number of exercises or saved data to load
    Configuring,
    SelectingExercises { slots: Vec<SlotChoice> },
    Previewing(Preview),
    Running(Preview),
    Complete(Preview),
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            AppState::Loading => "loading",
            AppState::Configuring => "configuring",
            AppState::SelectingExercises { .. } => "selecting exercises",
            AppState::Previewing(_) => "previewing",
            AppState::Running(_) => "running",
            AppState::Complete(_) => "complete",
        }
    }
}

/// One building session: owns the selector and walks the screens in order
pub struct Session<R = StdRng> {
    selector: ExerciseSelector<R>,
    state: AppState,
    /// Last accepted or loaded timer settings, offered again on the next form
    timer_config: Option<TimerConfig>,
}

impl<R: Rng> Session<R> {
    pub fn new(selector: ExerciseSelector<R>) -> Self {
        Self {
            selector,
            state: AppState::Loading,
            timer_config: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn selector(&self) -> &ExerciseSelector<R> {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut ExerciseSelector<R> {
        &mut self.selector
    }

    /// Timer settings to prefill, falling back to the defaults
    pub fn timer_config(&self) -> TimerConfig {
        self.timer_config.unwrap_or_default()
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.state.name(),
            action,
        }
    }

    fn transition(&mut self, next: AppState) {
        info!(from = self.state.name(), to = next.name(), "session transition");
        self.state = next;
    }

    /// Leave the main menu for the configuration screen
    pub fn load(&mut self) -> Result<(), SessionError> {
        if self.state != AppState::Loading {
            return Err(self.invalid("create a workout"));
        }
        self.transition(AppState::Configuring);
        Ok(())
    }

    /// Apply saved data: remember the timer config and, for a non-empty
    /// workout, open its exercises as already filled slots.
    ///
    /// An empty workout (nothing saved under that name) leaves the session on
    /// the configuration screen.
    pub fn load_saved(
        &mut self,
        workout: Vec<Exercise>,
        config: Option<TimerConfig>,
    ) -> Result<(), SessionError> {
        if self.state != AppState::Configuring {
            return Err(self.invalid("load saved data"));
        }
        if config.is_some() {
            self.timer_config = config;
        }
        if !workout.is_empty() {
            self.transition(AppState::SelectingExercises {
                slots: workout::slots_from_workout(&workout),
            });
        }
        Ok(())
    }

    /// Switch to another exercise bank (equipment choice)
    pub fn use_bank(&mut self, source: Box<dyn BankSource>) -> Result<(), SessionError> {
        if self.state != AppState::Configuring {
            return Err(self.invalid("change the exercise bank"));
        }
        self.selector
            .replace_source(source)
            .map_err(SessionError::Bank)
    }

    /// Open `num_exercises` blank slots
    pub fn configure(&mut self, num_exercises: usize) -> Result<(), SessionError> {
        if self.state != AppState::Configuring {
            return Err(self.invalid("configure exercises"));
        }
        if num_exercises == 0 {
            return Err(crate::error::ValidationError::ExerciseCount.into());
        }
        self.transition(AppState::SelectingExercises {
            slots: vec![SlotChoice::default(); num_exercises],
        });
        Ok(())
    }

    /// Resolve the slots and validate the timer, moving on to the preview.
    ///
    /// On failure the session stays on the selection screen.
    pub fn preview(
        &mut self,
        slots: Vec<SlotChoice>,
        config: TimerConfig,
    ) -> Result<&Preview, SessionError> {
        let AppState::SelectingExercises { slots: current } = &mut self.state else {
            return Err(self.invalid("preview"));
        };
        current.clone_from(&slots);

        let exercises = workout::build_workout(&slots, &mut self.selector)?;

        let preview = Preview::new(exercises, config)?;
        self.timer_config = Some(config);
        self.transition(AppState::Previewing(preview));
        match &self.state {
            AppState::Previewing(preview) => Ok(preview),
            _ => Err(BuildError::EmptyWorkout.into()),
        }
    }

    /// Back from the preview to the editable slots.
    ///
    /// Every slot holds the exercise it resolved to, so previewing again
    /// without edits gives the same workout.
    pub fn back_to_edit(&mut self) -> Result<&[SlotChoice], SessionError> {
        let AppState::Previewing(preview) = &self.state else {
            return Err(self.invalid("go back to edit"));
        };
        let slots = workout::slots_from_workout(&preview.exercises);
        self.transition(AppState::SelectingExercises { slots });
        Ok(self.slots().unwrap_or_default())
    }

    /// Slots on the selection screen, `None` on any other screen
    pub fn slots(&self) -> Option<&[SlotChoice]> {
        match &self.state {
            AppState::SelectingExercises { slots } => Some(slots),
            _ => None,
        }
    }

    /// Hand the previewed workout to a fresh timer
    pub fn start_run(&mut self) -> Result<TimerClock, SessionError> {
        let AppState::Previewing(preview) = &self.state else {
            return Err(self.invalid("start the timer"));
        };
        let clock = TimerClock::new(preview.exercises.clone(), &preview.config)?;
        let preview = preview.clone();
        self.transition(AppState::Running(preview));
        Ok(clock)
    }

    pub fn finish_run(&mut self) -> Result<(), SessionError> {
        let AppState::Running(preview) = &self.state else {
            return Err(self.invalid("finish the run"));
        };
        let preview = preview.clone();
        self.transition(AppState::Complete(preview));
        Ok(())
    }

    /// Leave the run view; the built workout stays for another start
    pub fn abandon_run(&mut self) -> Result<(), SessionError> {
        let AppState::Running(preview) = &self.state else {
            return Err(self.invalid("abandon the run"));
        };
        let preview = preview.clone();
        self.transition(AppState::Previewing(preview));
        Ok(())
    }

    /// Start over on the configuration screen with a fresh bank
    pub fn new_workout(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, AppState::Previewing(_) | AppState::Complete(_)) {
            return Err(self.invalid("start a new workout"));
        }
        self.selector.reset().map_err(SessionError::Bank)?;
        self.transition(AppState::Configuring);
        Ok(())
    }

    /// The workout being previewed, run or just finished
    pub fn preview_data(&self) -> Option<&Preview> {
        match &self.state {
            AppState::Previewing(p) | AppState::Running(p) | AppState::Complete(p) => Some(p),
            AppState::Loading | AppState::Configuring | AppState::SelectingExercises { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::{ExerciseBank, StaticBankSource};
    use crate::timer::{ClockStatus, Tick};
    use rand::SeedableRng;

    fn bank() -> ExerciseBank {
        let mut bank = ExerciseBank::new();
        bank.insert("strength", "legs", Exercise::manual("Squat"));
        bank.insert("strength", "legs", Exercise::manual("Lunge"));
        bank.insert("cardio", "full_body", Exercise::manual("Burpee"));
        bank
    }

    fn session() -> Session<StdRng> {
        let selector = ExerciseSelector::with_rng(
            Box::new(StaticBankSource(bank())),
            StdRng::seed_from_u64(42),
        )
        .unwrap();
        Session::new(selector)
    }

    fn config() -> TimerConfig {
        TimerConfig::new(2, 1, 1).unwrap()
    }

    fn to_preview(session: &mut Session<StdRng>) {
        session.load().unwrap();
        session.configure(2).unwrap();
        session
            .preview(
                vec![
                    SlotChoice::random(Some("strength"), Some("legs")),
                    SlotChoice::Manual("Plank".into()),
                ],
                config(),
            )
            .unwrap();
    }

    #[test]
    fn test_starts_in_loading() {
        let session = session();
        assert_eq!(session.state(), &AppState::Loading);
        assert_eq!(session.timer_config(), TimerConfig::default());
    }

    #[test]
    fn test_load_goes_to_configuring() {
        let mut session = session();
        session.load().unwrap();
        assert_eq!(session.state(), &AppState::Configuring);
        assert!(session.slots().is_none());
    }

    #[test]
    fn test_configure_opens_blank_slots() {
        let mut session = session();
        session.load().unwrap();
        session.configure(3).unwrap();
        match session.state() {
            AppState::SelectingExercises { slots } => {
                assert_eq!(slots.len(), 3);
                assert!(slots.iter().all(SlotChoice::is_blank));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_configure_zero_rejected() {
        let mut session = session();
        session.load().unwrap();
        let err = session.configure(0).unwrap_err();
        assert!(matches!(err, SessionError::Build(BuildError::Validation(_))));
        assert_eq!(session.state(), &AppState::Configuring);
    }

    #[test]
    fn test_preview_resolves_slots() {
        let mut session = session();
        to_preview(&mut session);

        let preview = session.preview_data().unwrap();
        assert_eq!(preview.exercises.len(), 2);
        assert!(["Squat", "Lunge"].contains(&preview.exercises[0].name.as_str()));
        assert_eq!(preview.exercises[1].name, "Plank");
        assert_eq!(session.timer_config(), config());
    }

    #[test]
    fn test_preview_failure_stays_selecting() {
        let mut session = session();
        session.load().unwrap();
        session.configure(1).unwrap();
        let err = session
            .preview(vec![SlotChoice::random(None, Some("neck"))], config())
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Build(BuildError::SelectionMiss { slot: 1 })
        ));
        assert_eq!(session.state().name(), "selecting exercises");
    }

    #[test]
    fn test_loaded_workout_used_as_is() {
        let mut session = session();
        session.load().unwrap();
        let saved = vec![
            Exercise::with_link("Squat", "https://example.com/squat"),
            Exercise::manual("Crunch"),
        ];
        let saved_config = TimerConfig::new(40, 20, 3).unwrap();
        session.load_saved(saved.clone(), Some(saved_config)).unwrap();
        assert_eq!(session.timer_config(), saved_config);

        let slots = session.slots().unwrap().to_vec();
        session.preview(slots, saved_config).unwrap();
        assert_eq!(session.preview_data().unwrap().exercises, saved);
        // Random picks can't offer a loaded exercise again
        assert!(!session.selector().bank().contains_name("Squat"));
    }

    #[test]
    fn test_load_saved_empty_workout_keeps_configuring() {
        let mut session = session();
        session.load().unwrap();
        let saved_config = TimerConfig::new(20, 10, 2).unwrap();
        session.load_saved(vec![], Some(saved_config)).unwrap();
        assert_eq!(session.state(), &AppState::Configuring);
        assert_eq!(session.timer_config(), saved_config);
    }

    #[test]
    fn test_load_saved_only_while_configuring() {
        let mut session = session();
        assert!(session.load_saved(vec![Exercise::manual("Squat")], None).is_err());
        assert_eq!(session.state(), &AppState::Loading);
    }

    #[test]
    fn test_back_to_edit_keeps_workout() {
        for seed in 0..20 {
            let selector = ExerciseSelector::with_rng(
                Box::new(StaticBankSource(bank())),
                StdRng::seed_from_u64(seed),
            )
            .unwrap();
            let mut session = Session::new(selector);
            to_preview(&mut session);
            let before = session.preview_data().cloned().unwrap();

            let slots = session.back_to_edit().unwrap().to_vec();
            assert_eq!(slots, workout::slots_from_workout(&before.exercises));

            let again = session.preview(slots, config()).unwrap();
            assert_eq!(again, &before, "seed {seed}");
        }
    }

    #[test]
    fn test_back_to_edit_single_exercise() {
        let mut only_squat = ExerciseBank::new();
        only_squat.insert("strength", "legs", Exercise::with_link("Squat", "images/squat.jpg"));
        let selector = ExerciseSelector::with_rng(
            Box::new(StaticBankSource(only_squat)),
            StdRng::seed_from_u64(9),
        )
        .unwrap();
        let mut session = Session::new(selector);
        session.load().unwrap();
        session.configure(1).unwrap();
        session
            .preview(vec![SlotChoice::random(Some("strength"), Some("legs"))], config())
            .unwrap();

        let slots = session.back_to_edit().unwrap().to_vec();
        let preview = session.preview(slots, config()).unwrap();
        assert_eq!(preview.exercises[0].name, "Squat");
        assert_eq!(preview.exercises[0].link.as_deref(), Some("images/squat.jpg"));
    }

    #[test]
    fn test_back_to_edit_reresolves_only_edited_slots() {
        let mut session = session();
        to_preview(&mut session);
        let leg = session.preview_data().unwrap().exercises[0].clone();

        let mut slots = session.back_to_edit().unwrap().to_vec();
        slots[1] = SlotChoice::random(Some("cardio"), None);

        let preview = session.preview(slots, config()).unwrap();
        assert_eq!(preview.exercises[0], leg);
        assert_eq!(preview.exercises[1].name, "Burpee");
    }

    #[test]
    fn test_run_lifecycle() {
        let mut session = session();
        to_preview(&mut session);

        let mut clock = session.start_run().unwrap();
        assert_eq!(session.state().name(), "running");

        let mut sink = |_: &Tick<'_>| {};
        clock.start(&mut sink);
        while clock.tick(&mut sink) == ClockStatus::Running {}

        session.finish_run().unwrap();
        assert_eq!(session.state().name(), "complete");

        session.new_workout().unwrap();
        assert_eq!(session.state(), &AppState::Configuring);
        assert!(session.selector().bank().contains_name("Squat"));
        assert!(session.selector().bank().contains_name("Lunge"));
    }

    #[test]
    fn test_abandon_returns_to_preview() {
        let mut session = session();
        to_preview(&mut session);
        let before = session.preview_data().cloned();

        let _clock = session.start_run().unwrap();
        session.abandon_run().unwrap();
        assert_eq!(session.state().name(), "previewing");
        assert_eq!(session.preview_data().cloned(), before);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = session();
        assert!(matches!(
            session.start_run(),
            Err(SessionError::InvalidTransition { from: "loading", .. })
        ));
        assert!(session.configure(2).is_err());
        assert!(session.back_to_edit().is_err());
        assert!(session.finish_run().is_err());
        assert!(session.new_workout().is_err());

        session.load().unwrap();
        assert!(session.load().is_err());
        assert!(session.preview(vec![], config()).is_err());
    }

    #[test]
    fn test_use_bank_only_while_configuring() {
        let mut session = session();
        let mut other = ExerciseBank::new();
        other.insert("bodyweight", "abs", Exercise::manual("Crunch"));

        assert!(session.use_bank(Box::new(StaticBankSource(other.clone()))).is_err());
        session.load().unwrap();
        session.use_bank(Box::new(StaticBankSource(other))).unwrap();
        assert_eq!(session.selector().exercise_categories(), vec!["bodyweight"]);
    }
}
