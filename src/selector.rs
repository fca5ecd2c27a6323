//! Exercise selection - resolves partial (category, body part) queries against the bank

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::exercises::{BankSource, ExerciseBank};

/// Name and link of a resolved exercise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub link: Option<String>,
}

/// Picks exercises from a session-owned copy of the bank.
///
/// Missing query dimensions are filled by uniform random choice among the
/// bank keys compatible with whatever was given. Consumed exercises are
/// removed by name so a building session never offers them twice, until
/// [`ExerciseSelector::reset`] reloads the bank from its source.
pub struct ExerciseSelector<R = StdRng> {
    source: Box<dyn BankSource>,
    bank: ExerciseBank,
    rng: R,
}

impl ExerciseSelector<StdRng> {
    pub fn new(source: impl BankSource + 'static) -> Result<Self> {
        Self::with_rng(Box::new(source), StdRng::from_entropy())
    }
}

impl<R: Rng> ExerciseSelector<R> {
    pub fn with_rng(source: Box<dyn BankSource>, rng: R) -> Result<Self> {
        let bank = source.load()?;
        info!(categories = bank.categories().len(), "exercise bank loaded");
        Ok(Self { source, bank, rng })
    }

    /// Resolve a query into one exercise, `None` on any lookup miss.
    ///
    /// Empty strings count as absent.
    pub fn select_exercise(
        &mut self,
        category: Option<&str>,
        body_part: Option<&str>,
    ) -> Option<Selection> {
        let category = category.filter(|c| !c.is_empty());
        let body_part = body_part.filter(|b| !b.is_empty());

        let picked = self.pick(category, body_part);
        match &picked {
            Some(selection) => debug!(?category, ?body_part, name = %selection.name, "exercise selected"),
            None => debug!(?category, ?body_part, "no exercise for query"),
        }
        picked
    }

    fn pick(&mut self, category: Option<&str>, body_part: Option<&str>) -> Option<Selection> {
        let bank = &self.bank;
        let rng = &mut self.rng;

        let (category, body_part) = match (category, body_part) {
            (None, None) => {
                let category = *bank.categories().choose(rng)?;
                let body_part = *bank.body_parts_of(category)?.choose(rng)?;
                (category, body_part)
            }
            // Only categories that actually file this body part are candidates
            (None, Some(body_part)) => {
                let category = *bank.categories_with(body_part).choose(rng)?;
                (category, body_part)
            }
            // Any body part of the category, even one whose list is empty
            (Some(category), None) => {
                let body_part = *bank.body_parts_of(category)?.choose(rng)?;
                (category, body_part)
            }
            (Some(category), Some(body_part)) => (category, body_part),
        };

        let exercise = bank.exercises(category, body_part)?.choose(rng)?;
        Some(Selection {
            name: exercise.name.clone(),
            link: exercise.link.clone(),
        })
    }

    /// Custom exercise typed by the user
    pub fn manual_entry(&self, name: &str) -> Selection {
        Selection {
            name: name.to_string(),
            link: None,
        }
    }

    pub fn exercise_categories(&self) -> Vec<String> {
        self.bank.categories().into_iter().map(str::to_string).collect()
    }

    pub fn body_parts(&self) -> Vec<String> {
        self.bank.body_parts().into_iter().map(str::to_string).collect()
    }

    /// Remove every record with this name so it is not offered again
    pub fn remove_exercise(&mut self, name: &str) {
        let removed = self.bank.remove_named(name);
        if removed > 0 {
            debug!(name, removed, "exercise removed from bank");
        }
    }

    /// Reload the bank from its source, undoing all removals
    pub fn reset(&mut self) -> Result<()> {
        self.bank = self.source.load()?;
        info!("exercise bank reset");
        Ok(())
    }

    /// Swap the backing source and load it
    pub fn replace_source(&mut self, source: Box<dyn BankSource>) -> Result<()> {
        self.bank = source.load()?;
        self.source = source;
        info!(categories = self.bank.categories().len(), "exercise bank replaced");
        Ok(())
    }

    pub fn bank(&self) -> &ExerciseBank {
        &self.bank
    }
}
