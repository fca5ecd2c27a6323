//! Workout building - exercise slots, timer settings and the preview

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BuildError, SlotParseError, ValidationError};
use crate::exercises::{Exercise, LinkKind};
use crate::selector::ExerciseSelector;

pub const DEFAULT_WORK_SECS: u32 = 30;
pub const DEFAULT_REST_SECS: u32 = 15;
pub const DEFAULT_ROUNDS: u32 = 1;

/// Work/rest/rounds schedule, valid by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimerConfig")]
pub struct TimerConfig {
    work_duration: u32,
    rest_duration: u32,
    rounds: u32,
}

#[derive(Deserialize)]
struct RawTimerConfig {
    work_duration: i64,
    rest_duration: i64,
    rounds: i64,
}

impl TryFrom<RawTimerConfig> for TimerConfig {
    type Error = ValidationError;

    fn try_from(raw: RawTimerConfig) -> Result<Self, Self::Error> {
        Self::checked(raw.work_duration, raw.rest_duration, raw.rounds)
    }
}

impl TimerConfig {
    pub fn new(work_duration: u32, rest_duration: u32, rounds: u32) -> Result<Self, ValidationError> {
        Self::checked(work_duration.into(), rest_duration.into(), rounds.into())
    }

    /// Parse the three text fields of the timer form
    pub fn parse(work: &str, rest: &str, rounds: &str) -> Result<Self, ValidationError> {
        let work = parse_number(work, "work duration")?;
        let rest = parse_number(rest, "rest duration")?;
        let rounds = parse_number(rounds, "rounds")?;
        Self::checked(work, rest, rounds)
    }

    fn checked(work: i64, rest: i64, rounds: i64) -> Result<Self, ValidationError> {
        if work <= 0 {
            return Err(ValidationError::WorkDuration);
        }
        if rest < 0 {
            return Err(ValidationError::RestDuration);
        }
        if rounds <= 0 {
            return Err(ValidationError::Rounds);
        }
        Ok(Self {
            work_duration: u32::try_from(work).map_err(|_| ValidationError::NotANumber {
                field: "work duration",
            })?,
            rest_duration: u32::try_from(rest).map_err(|_| ValidationError::NotANumber {
                field: "rest duration",
            })?,
            rounds: u32::try_from(rounds)
                .map_err(|_| ValidationError::NotANumber { field: "rounds" })?,
        })
    }

    pub fn work_duration(&self) -> u32 {
        self.work_duration
    }

    pub fn rest_duration(&self) -> u32 {
        self.rest_duration
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Length of a whole workout with this many exercises, in seconds
    pub fn total_seconds(&self, exercise_count: usize) -> u64 {
        exercise_count as u64
            * u64::from(self.rounds)
            * (u64::from(self.work_duration) + u64::from(self.rest_duration))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_SECS,
            rest_duration: DEFAULT_REST_SECS,
            rounds: DEFAULT_ROUNDS,
        }
    }
}

impl fmt::Display for TimerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timer: {}s work, {}s rest, {} rounds",
            self.work_duration, self.rest_duration, self.rounds
        )
    }
}

fn parse_number(text: &str, field: &'static str) -> Result<i64, ValidationError> {
    text.trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber { field })
}

/// Validate the "number of exercises" input
pub fn parse_exercise_count(text: &str) -> Result<usize, ValidationError> {
    let count = parse_number(text, "number of exercises")?;
    if count <= 0 {
        return Err(ValidationError::ExerciseCount);
    }
    usize::try_from(count).map_err(|_| ValidationError::ExerciseCount)
}

/// How one exercise slot of the workout gets filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotChoice {
    Manual(String),
    Random {
        category: Option<String>,
        body_part: Option<String>,
    },
    /// Already filled (loaded from disk or kept from the last preview), used as-is
    Resolved(Exercise),
}

impl SlotChoice {
    pub fn random(category: Option<&str>, body_part: Option<&str>) -> Self {
        SlotChoice::Random {
            category: category.map(str::to_string),
            body_part: body_part.map(str::to_string),
        }
    }

    /// Neither a name nor any query dimension
    pub fn is_blank(&self) -> bool {
        match self {
            SlotChoice::Manual(name) => name.trim().is_empty(),
            SlotChoice::Resolved(exercise) => exercise.name.trim().is_empty(),
            SlotChoice::Random {
                category,
                body_part,
            } => {
                category.as_deref().is_none_or(str::is_empty)
                    && body_part.as_deref().is_none_or(str::is_empty)
            }
        }
    }
}

impl Default for SlotChoice {
    fn default() -> Self {
        SlotChoice::Random {
            category: None,
            body_part: None,
        }
    }
}

impl FromStr for SlotChoice {
    type Err = SlotParseError;

    /// `manual:<name>` or `random:<category>/<body part>` (either side may be empty)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("manual:") {
            let name = name.trim();
            if name.is_empty() {
                return Err(SlotParseError::EmptyName);
            }
            return Ok(SlotChoice::Manual(name.to_string()));
        }

        if let Some(query) = s.strip_prefix("random:") {
            let (category, body_part) = query.split_once('/').unwrap_or((query, ""));
            return Ok(SlotChoice::random(non_blank(category), non_blank(body_part)));
        }

        Err(SlotParseError::UnknownKind(s.to_string()))
    }
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

impl fmt::Display for SlotChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotChoice::Manual(name) => write!(f, "manual:{name}"),
            SlotChoice::Resolved(exercise) => write!(f, "{}", exercise.name),
            SlotChoice::Random {
                category,
                body_part,
            } => write!(
                f,
                "random:{}/{}",
                category.as_deref().unwrap_or_default(),
                body_part.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Resolve every slot into a concrete exercise, in order.
///
/// Each resolved exercise is removed from the selector's bank so later slots
/// can't pick it again. `Resolved` slots are kept verbatim and their names are
/// taken out of the bank before any random pick. Stops at the first slot that
/// cannot be filled.
pub fn build_workout<R: Rng>(
    slots: &[SlotChoice],
    selector: &mut ExerciseSelector<R>,
) -> Result<Vec<Exercise>, BuildError> {
    let mut workout = Vec::with_capacity(slots.len());

    for slot in slots {
        if let SlotChoice::Resolved(exercise) = slot {
            selector.remove_exercise(&exercise.name);
        }
    }

    for (index, slot) in slots.iter().enumerate() {
        let number = index + 1;
        if slot.is_blank() {
            return Err(BuildError::EmptySlot { slot: number });
        }

        let exercise = match slot {
            SlotChoice::Resolved(exercise) => exercise.clone(),
            SlotChoice::Manual(name) => {
                let picked = selector.manual_entry(name.trim());
                Exercise::manual(picked.name)
            }
            SlotChoice::Random {
                category,
                body_part,
            } => {
                let category = category.as_deref().filter(|c| !c.is_empty());
                let body_part = body_part.as_deref().filter(|b| !b.is_empty());
                let Some(picked) = selector.select_exercise(category, body_part) else {
                    warn!(slot = number, ?category, ?body_part, "no exercise found for slot");
                    return Err(BuildError::SelectionMiss { slot: number });
                };
                Exercise {
                    name: picked.name,
                    link: picked.link,
                    exercise_type: category.map(str::to_string),
                    body_part: body_part.map(str::to_string),
                }
            }
        };

        selector.remove_exercise(&exercise.name);
        debug!(slot = number, name = %exercise.name, "slot resolved");
        workout.push(exercise);
    }

    if workout.is_empty() {
        return Err(BuildError::EmptyWorkout);
    }
    Ok(workout)
}

/// Editable slots holding an already built workout, one `Resolved` slot per exercise
pub fn slots_from_workout(workout: &[Exercise]) -> Vec<SlotChoice> {
    workout.iter().cloned().map(SlotChoice::Resolved).collect()
}

/// A validated workout ready to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub exercises: Vec<Exercise>,
    pub config: TimerConfig,
}

impl Preview {
    pub fn new(exercises: Vec<Exercise>, config: TimerConfig) -> Result<Self, BuildError> {
        if exercises.is_empty() {
            return Err(BuildError::EmptyWorkout);
        }
        Ok(Self { exercises, config })
    }

    pub fn total_seconds(&self) -> u64 {
        self.config.total_seconds(self.exercises.len())
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workout Preview")?;
        for (i, exercise) in self.exercises.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, exercise.name)?;
            match (exercise.link_kind(), exercise.link.as_deref()) {
                (LinkKind::Image, Some(link)) => writeln!(f, "   image: {link}")?,
                (LinkKind::Video, Some(link)) => {
                    writeln!(f, "   {} example link: {link}", exercise.name)?
                }
                _ => {}
            }
        }
        write!(f, "{}", self.config)
    }
}
