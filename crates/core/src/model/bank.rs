use std::collections::HashMap;

use crate::model::ids::UnitName;
use crate::model::mode::QuizMode;
use crate::model::question::Question;

/// Loaded questions grouped by unit.
///
/// A bank is built from one load pass and then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    units: HashMap<UnitName, Vec<Question>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bucket for `unit` with `questions`.
    ///
    /// Questions are re-homed under `unit` so every entry belongs to its bucket.
    pub fn insert_unit(&mut self, unit: UnitName, questions: Vec<Question>) {
        let questions = questions
            .into_iter()
            .map(|q| q.with_unit(unit.clone()))
            .collect();
        self.units.insert(unit, questions);
    }

    /// Append `question` into the bucket named by its own unit.
    ///
    /// Returns `false` (and drops the question) when no such bucket exists.
    pub fn route(&mut self, question: Question) -> bool {
        match self.units.get_mut(question.unit()) {
            Some(bucket) => {
                bucket.push(question);
                true
            }
            None => false,
        }
    }

    /// Questions of `unit`, empty when the unit was not loaded.
    #[must_use]
    pub fn questions(&self, unit: &UnitName) -> &[Question] {
        self.units.get(unit).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn contains_unit(&self, unit: &UnitName) -> bool {
        self.units.contains_key(unit)
    }

    /// Total number of questions across all units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of questions in `units` admitted by `mode`.
    #[must_use]
    pub fn count_for(&self, units: &[UnitName], mode: QuizMode) -> usize {
        units
            .iter()
            .flat_map(|unit| self.questions(unit))
            .filter(|q| mode.admits(q))
            .count()
    }
}
