//! Storage module - JSON files for saved workouts and timer configs

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info};

use crate::exercises::Exercise;
use crate::workout::TimerConfig;

const WORKOUTS_DIR: &str = "workouts";
const TIMERS_DIR: &str = "timers";

/// Saved data under one root directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workouts_dir(&self) -> PathBuf {
        self.root.join(WORKOUTS_DIR)
    }

    fn timers_dir(&self) -> PathBuf {
        self.root.join(TIMERS_DIR)
    }

    pub fn save_workout(&self, name: &str, exercises: &[Exercise]) -> Result<PathBuf> {
        let path = write_json(&self.workouts_dir(), name, exercises)?;
        info!(path = %path.display(), exercises = exercises.len(), "workout saved");
        Ok(path)
    }

    /// Load a saved workout; a missing file is an empty workout.
    ///
    /// Entries sharing a name collapse into one: the first position, the last record.
    pub fn load_workout(&self, name: &str) -> Result<Vec<Exercise>> {
        let path = saved_file(&self.workouts_dir(), name)?;
        if !path.exists() {
            debug!(path = %path.display(), "no saved workout");
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read workout {}", path.display()))?;
        let exercises: Vec<Exercise> = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse workout {}", path.display()))?;

        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut workout: Vec<Exercise> = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            match positions.get(&exercise.name) {
                Some(&index) => workout[index] = exercise,
                None => {
                    positions.insert(exercise.name.clone(), workout.len());
                    workout.push(exercise);
                }
            }
        }
        Ok(workout)
    }

    pub fn save_timer_config(&self, name: &str, config: &TimerConfig) -> Result<PathBuf> {
        let path = write_json(&self.timers_dir(), name, config)?;
        info!(path = %path.display(), "timer config saved");
        Ok(path)
    }

    /// Load a saved timer config, `None` if there is no such file
    pub fn load_timer_config(&self, name: &str) -> Result<Option<TimerConfig>> {
        let path = saved_file(&self.timers_dir(), name)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read timer config {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("invalid timer config {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn list_workouts(&self) -> Result<Vec<String>> {
        list_files(&self.workouts_dir())
    }

    pub fn list_timer_configs(&self) -> Result<Vec<String>> {
        list_files(&self.timers_dir())
    }
}

/// `dir/name`, where `name` must be a plain file name
fn saved_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\']) {
        bail!("invalid file name {:?}: use a plain name without directories", name);
    }
    Ok(dir.join(name))
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = saved_file(dir, name)?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Regular files in `dir`, sorted; a missing directory lists nothing
fn list_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
