use std::sync::Arc;

use futures::future::{try_join, try_join_all};
use tracing::debug;

use quiz_core::model::{Question, QuestionBank, SourceId, UnitName};
use storage::{QuestionSource, parse_chain_records, parse_unit_records};

use crate::config::UnitEntry;
use crate::error::LoadError;

/// Fetches the selected units (and the shared chain source) into a fresh bank.
#[derive(Clone)]
pub struct BankLoader {
    source: Arc<dyn QuestionSource>,
}

impl BankLoader {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self { source }
    }

    /// Load `units` and, when given, route the chain records of `chains`
    /// into their buckets.
    ///
    /// All sources are fetched concurrently and joined; the first failure
    /// aborts the load and no bank is returned. Chain records naming a unit
    /// that was not selected are dropped.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NoUnitsSelected` before any fetch if `units` is empty,
    /// and `LoadError::Source` for unavailable sources or malformed records.
    pub async fn load(
        &self,
        units: &[UnitEntry],
        chains: Option<&SourceId>,
    ) -> Result<QuestionBank, LoadError> {
        if units.is_empty() {
            return Err(LoadError::NoUnitsSelected);
        }

        let unit_loads = try_join_all(units.iter().map(|entry| self.load_unit(entry)));
        let chain_load = async {
            match chains {
                Some(id) => self.load_chains(id).await.map(Some),
                None => Ok(None),
            }
        };
        let (buckets, chain_questions) = try_join(unit_loads, chain_load).await?;

        let mut bank = QuestionBank::new();
        for (unit, questions) in buckets {
            bank.insert_unit(unit, questions);
        }

        for question in chain_questions.into_iter().flatten() {
            let unit = question.unit().clone();
            if !bank.route(question) {
                debug!(%unit, "dropping chain question for unselected unit");
            }
        }

        debug!(units = units.len(), questions = bank.len(), "question bank loaded");
        Ok(bank)
    }

    async fn load_unit(&self, entry: &UnitEntry) -> Result<(UnitName, Vec<Question>), LoadError> {
        let text = self.source.fetch(&entry.source).await?;
        let questions = parse_unit_records(&entry.source, &text, &entry.name)?;
        debug!(unit = %entry.name, source = %entry.source, count = questions.len(), "unit loaded");
        Ok((entry.name.clone(), questions))
    }

    async fn load_chains(&self, id: &SourceId) -> Result<Vec<Question>, LoadError> {
        let text = self.source.fetch(id).await?;
        let questions = parse_chain_records(id, &text)?;
        debug!(source = %id, count = questions.len(), "chain source loaded");
        Ok(questions)
    }
}
