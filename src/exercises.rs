//! Exercise definitions - the categorized exercise bank and where it comes from

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single exercise as stored in the bank or in a saved workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Category the exercise was selected from (absent for manual entries)
    #[serde(default, rename = "type")]
    pub exercise_type: Option<String>,
    #[serde(default)]
    pub body_part: Option<String>,
}

impl Exercise {
    /// Exercise typed in by the user, not taken from the bank
    pub fn manual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: None,
            exercise_type: None,
            body_part: None,
        }
    }

    pub fn with_link(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            ..Self::manual(name)
        }
    }

    pub fn link_kind(&self) -> LinkKind {
        LinkKind::of(self.link.as_deref())
    }
}

/// How an exercise reference link should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Image,
    Video,
    None,
}

impl LinkKind {
    pub fn of(link: Option<&str>) -> Self {
        match link {
            None => LinkKind::None,
            Some(l) if l.is_empty() => LinkKind::None,
            Some(l) if l.ends_with("jpg") || l.ends_with("png") => LinkKind::Image,
            Some(_) => LinkKind::Video,
        }
    }
}

/// Bank variant picked on the configuration screen, bodyweight-only unless equipment is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Equipment {
    WithEquipment,
    #[default]
    NoEquipment,
}

impl Equipment {
    pub fn file_name(&self) -> &'static str {
        match self {
            Equipment::WithEquipment => "exercises.json",
            Equipment::NoEquipment => "no_equipment_exercises.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Equipment::WithEquipment => "Equipment",
            Equipment::NoEquipment => "No Equipment",
        }
    }
}

/// category -> body part -> exercises
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseBank {
    categories: BTreeMap<String, BTreeMap<String, Vec<Exercise>>>,
}

impl ExerciseBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let bank: Self = serde_json::from_str(json).context("invalid exercise bank JSON")?;
        Ok(bank)
    }

    /// Append an exercise under (category, body part), creating both keys if needed
    pub fn insert(&mut self, category: &str, body_part: &str, exercise: Exercise) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .entry(body_part.to_string())
            .or_default()
            .push(exercise);
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    /// Body parts filed under a category, `None` if the category is unknown
    pub fn body_parts_of(&self, category: &str) -> Option<Vec<&str>> {
        self.categories
            .get(category)
            .map(|parts| parts.keys().map(String::as_str).collect())
    }

    /// Every body part that appears in any category, sorted and deduplicated
    pub fn body_parts(&self) -> Vec<&str> {
        let all: BTreeSet<&str> = self
            .categories
            .values()
            .flat_map(|parts| parts.keys().map(String::as_str))
            .collect();
        all.into_iter().collect()
    }

    /// Categories that contain the given body part key
    pub fn categories_with(&self, body_part: &str) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|(_, parts)| parts.contains_key(body_part))
            .map(|(category, _)| category.as_str())
            .collect()
    }

    pub fn exercises(&self, category: &str, body_part: &str) -> Option<&[Exercise]> {
        self.categories
            .get(category)?
            .get(body_part)
            .map(Vec::as_slice)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.categories
            .values()
            .flat_map(|parts| parts.values())
            .any(|list| list.iter().any(|e| e.name == name))
    }

    /// Drop every record with this name from every list, returns how many were removed
    pub fn remove_named(&mut self, name: &str) -> usize {
        let mut removed = 0;
        for parts in self.categories.values_mut() {
            for list in parts.values_mut() {
                let before = list.len();
                list.retain(|e| e.name != name);
                removed += before - list.len();
            }
        }
        removed
    }
}

/// Backing store the selector reloads the bank from
pub trait BankSource {
    fn load(&self) -> Result<ExerciseBank>;
}

/// Bank stored as a nested JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonBankSource {
    path: PathBuf,
}

impl JsonBankSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Bank file for the equipment choice inside `data_dir`
    pub fn for_equipment(data_dir: &Path, equipment: Equipment) -> Self {
        Self::new(data_dir.join(equipment.file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BankSource for JsonBankSource {
    fn load(&self) -> Result<ExerciseBank> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read exercise bank {}", self.path.display()))?;
        let bank = ExerciseBank::from_json(&json)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        debug!(path = %self.path.display(), categories = bank.categories().len(), "bank loaded");
        Ok(bank)
    }
}

/// In-memory bank, every load hands out a fresh copy
#[derive(Debug, Clone)]
pub struct StaticBankSource(pub ExerciseBank);

impl BankSource for StaticBankSource {
    fn load(&self) -> Result<ExerciseBank> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK_JSON: &str = r#"{
        "strength": {
            "legs": [
                {"name": "Squat", "link": "https://example.com/squat"},
                {"name": "Lunge", "link": "images/lunge.png"}
            ],
            "upper_body": [
                {"name": "Push-up", "link": "https://example.com/pushup"}
            ]
        },
        "cardio": {
            "legs": [
                {"name": "Squat", "link": "https://example.com/jump-squat"}
            ],
            "full_body": []
        }
    }"#;

    #[test]
    fn test_from_json_structure() {
        let bank = ExerciseBank::from_json(BANK_JSON).unwrap();
        assert_eq!(bank.categories(), vec!["cardio", "strength"]);
        assert_eq!(bank.body_parts_of("strength").unwrap(), vec!["legs", "upper_body"]);
        assert!(bank.body_parts_of("yoga").is_none());
        assert_eq!(bank.exercises("strength", "legs").unwrap().len(), 2);
        assert_eq!(bank.exercises("cardio", "full_body").unwrap().len(), 0);
    }

    #[test]
    fn test_missing_optional_fields_are_none() {
        let bank = ExerciseBank::from_json(r#"{"a": {"b": [{"name": "Plank"}]}}"#).unwrap();
        let plank = &bank.exercises("a", "b").unwrap()[0];
        assert_eq!(plank.name, "Plank");
        assert!(plank.link.is_none());
        assert!(plank.exercise_type.is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ExerciseBank::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_body_parts_union() {
        let bank = ExerciseBank::from_json(BANK_JSON).unwrap();
        assert_eq!(bank.body_parts(), vec!["full_body", "legs", "upper_body"]);
    }

    #[test]
    fn test_categories_with_body_part() {
        let bank = ExerciseBank::from_json(BANK_JSON).unwrap();
        assert_eq!(bank.categories_with("legs"), vec!["cardio", "strength"]);
        assert_eq!(bank.categories_with("upper_body"), vec!["strength"]);
        assert!(bank.categories_with("neck").is_empty());
    }

    #[test]
    fn test_remove_named_removes_all_duplicates() {
        let mut bank = ExerciseBank::from_json(BANK_JSON).unwrap();
        assert_eq!(bank.remove_named("Squat"), 2);
        assert!(!bank.contains_name("Squat"));
        assert!(bank.contains_name("Lunge"));
        // Emptied lists keep their keys
        assert_eq!(bank.exercises("cardio", "legs").unwrap().len(), 0);
    }

    #[test]
    fn test_remove_named_unknown_is_noop() {
        let mut bank = ExerciseBank::from_json(BANK_JSON).unwrap();
        let before = bank.clone();
        assert_eq!(bank.remove_named("Burpee"), 0);
        assert_eq!(bank, before);
    }

    #[test]
    fn test_link_kind() {
        assert_eq!(LinkKind::of(Some("img/squat.jpg")), LinkKind::Image);
        assert_eq!(LinkKind::of(Some("img/squat.png")), LinkKind::Image);
        assert_eq!(LinkKind::of(Some("https://youtu.be/x")), LinkKind::Video);
        assert_eq!(LinkKind::of(Some("")), LinkKind::None);
        assert_eq!(LinkKind::of(None), LinkKind::None);
    }

    #[test]
    fn test_equipment_file_names() {
        assert_eq!(Equipment::WithEquipment.file_name(), "exercises.json");
        assert_eq!(Equipment::NoEquipment.file_name(), "no_equipment_exercises.json");
        assert_eq!(Equipment::default(), Equipment::NoEquipment);
    }

    #[test]
    fn test_json_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercises.json");
        std::fs::write(&path, BANK_JSON).unwrap();

        let source = JsonBankSource::for_equipment(dir.path(), Equipment::WithEquipment);
        assert_eq!(source.path(), path.as_path());
        let bank = source.load().unwrap();
        assert!(bank.contains_name("Push-up"));
    }

    #[test]
    fn test_json_source_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonBankSource::new(dir.path().join("nope.json"));
        assert!(source.load().is_err());
    }

    #[test]
    fn test_bundled_banks_parse() {
        for json in [
            include_str!("../data/exercises.json"),
            include_str!("../data/no_equipment_exercises.json"),
        ] {
            let bank = ExerciseBank::from_json(json).unwrap();
            assert!(!bank.is_empty());
            assert!(bank.body_parts().contains(&"legs"));
        }
    }

    #[test]
    fn test_static_source_returns_fresh_copy() {
        let mut bank = ExerciseBank::new();
        bank.insert("strength", "legs", Exercise::manual("Squat"));
        let source = StaticBankSource(bank);

        let mut first = source.load().unwrap();
        first.remove_named("Squat");
        assert!(source.load().unwrap().contains_name("Squat"));
    }
}
