use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use quiz_core::model::{
    Answer, QuestionBank, QuizMode, SessionSummary, SessionToken, SourceId, UnitName,
};
use quiz_core::{Clock, Feedback};
use storage::QuestionSource;

use crate::config::{QuizConfig, UnitEntry};
use crate::error::{ConfigError, LoadError, QuizError, SessionError};
use crate::loader::BankLoader;
use crate::sessions::{
    Advance, QuestionView, QuizSession, SessionBuilder, SessionPhase, SessionProgress,
};

/// Outcome of a session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A session is running; `matching` counts questions before truncation.
    Started { total: usize, matching: usize },
    /// Nothing matched the selected units and mode. Not an error: suggest
    /// loosening the filters.
    NoQuestionsMatched,
    /// A newer start or a reset superseded this load; its result was dropped.
    Discarded,
}

/// Units, mode and count a start was issued with.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StartSettings {
    units: Vec<UnitName>,
    mode: QuizMode,
    count: usize,
}

/// A session start whose data has not been loaded yet.
///
/// Owns everything it needs, so it can be run on a spawned task while the
/// controller keeps serving the current session. The settings in force at
/// `begin_start` are the ones the session is assembled from.
#[derive(Clone)]
pub struct PendingStart {
    token: SessionToken,
    loader: BankLoader,
    entries: Vec<UnitEntry>,
    chains: Option<SourceId>,
    settings: StartSettings,
}

impl PendingStart {
    #[must_use]
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Fetch and parse every source of this start.
    pub async fn run(self) -> LoadedStart {
        let result = self.loader.load(&self.entries, self.chains.as_ref()).await;
        LoadedStart {
            token: self.token,
            settings: self.settings,
            result,
        }
    }
}

/// Result of `PendingStart::run`, to be handed back to `QuizController::finish_start`.
#[derive(Debug)]
pub struct LoadedStart {
    token: SessionToken,
    settings: StartSettings,
    result: Result<QuestionBank, LoadError>,
}

impl LoadedStart {
    #[must_use]
    pub fn token(&self) -> SessionToken {
        self.token
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Owner of all quiz state: settings, the loaded bank and the running session.
///
/// Presentation layers call the methods below in response to user actions;
/// nothing else mutates the state.
pub struct QuizController {
    config: QuizConfig,
    loader: BankLoader,
    clock: Clock,
    rng: StdRng,
    selected: Vec<UnitName>,
    mode: QuizMode,
    count: usize,
    bank: QuestionBank,
    session: Option<QuizSession>,
    token: SessionToken,
}

impl QuizController {
    #[must_use]
    pub fn new(config: QuizConfig, source: Arc<dyn QuestionSource>) -> Self {
        let count = config.default_count;
        Self {
            config,
            loader: BankLoader::new(source),
            clock: Clock::default_clock(),
            rng: StdRng::from_os_rng(),
            selected: Vec::new(),
            mode: QuizMode::default(),
            count,
            bank: QuestionBank::new(),
            session: None,
            token: SessionToken::default(),
        }
    }

    /// Build a controller reading from the config's `data_root`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDataRoot` if the data root cannot be used.
    pub fn from_config(config: QuizConfig) -> Result<Self, ConfigError> {
        let source = config.source()?;
        Ok(Self::new(config, source))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Use a seeded shuffle, for reproducible sessions.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Selectable units, in catalog order.
    #[must_use]
    pub fn catalog(&self) -> &[UnitEntry] {
        &self.config.units
    }

    #[must_use]
    pub fn selected_units(&self) -> &[UnitName] {
        &self.selected
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Bank of the last successful load.
    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    //
    // ─── SETTINGS ──────────────────────────────────────────────────────────────
    //

    /// Replace the unit selection. Duplicates are ignored; order is kept.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoUnitsSelected` for an empty selection and
    /// `QuizError::UnknownUnit` for names missing from the catalog. The
    /// previous selection is kept on error.
    pub fn select_units<I, S>(&mut self, names: I) -> Result<(), QuizError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<UnitName> = Vec::new();
        for raw in names {
            let raw = raw.as_ref();
            let name =
                UnitName::new(raw).map_err(|_| QuizError::UnknownUnit(raw.to_string()))?;
            if self.config.unit(&name).is_none() {
                return Err(QuizError::UnknownUnit(name.to_string()));
            }
            if !selected.contains(&name) {
                selected.push(name);
            }
        }
        if selected.is_empty() {
            return Err(QuizError::NoUnitsSelected);
        }
        self.selected = selected;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: QuizMode) {
        self.mode = mode;
    }

    /// Set the desired session length; missing or non-positive values fall
    /// back to the default. Returns the effective count.
    pub fn set_count(&mut self, raw: Option<i64>) -> usize {
        self.count = raw
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(self.config.default_count);
        self.count
    }

    //
    // ─── SESSION START ─────────────────────────────────────────────────────────
    //

    /// Load the selected units and assemble a new session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoUnitsSelected` before any fetch when nothing is
    /// selected, and `QuizError::Source` when a source is unavailable or
    /// malformed. The previous session is untouched on error.
    pub async fn start_session(&mut self) -> Result<StartOutcome, QuizError> {
        let pending = self.begin_start()?;
        let loaded = pending.run().await;
        self.finish_start(loaded)
    }

    /// First half of `start_session`: validate the selection and issue a new
    /// session token. Any load still in flight becomes stale.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoUnitsSelected` when nothing is selected.
    pub fn begin_start(&mut self) -> Result<PendingStart, QuizError> {
        if self.selected.is_empty() {
            return Err(QuizError::NoUnitsSelected);
        }
        let entries = self
            .selected
            .iter()
            .map(|name| {
                self.config
                    .unit(name)
                    .cloned()
                    .ok_or_else(|| QuizError::UnknownUnit(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.token = self.token.next();
        debug!(token = %self.token, units = entries.len(), "session load started");

        Ok(PendingStart {
            token: self.token,
            loader: self.loader.clone(),
            entries,
            chains: self.config.chains.clone(),
            settings: StartSettings {
                units: self.selected.clone(),
                mode: self.mode,
                count: self.count,
            },
        })
    }

    /// Second half of `start_session`: apply a finished load.
    ///
    /// Results whose token is no longer current are dropped silently.
    ///
    /// # Errors
    ///
    /// Returns the load error, if any; the previous session is kept.
    pub fn finish_start(&mut self, loaded: LoadedStart) -> Result<StartOutcome, QuizError> {
        if loaded.token != self.token {
            debug!(
                stale = %loaded.token,
                current = %self.token,
                "discarding stale session load"
            );
            return Ok(StartOutcome::Discarded);
        }

        let LoadedStart {
            token,
            settings,
            result,
        } = loaded;
        let bank = result.inspect_err(|e| {
            warn!(error = %e, "question bank load failed");
        })?;
        let StartSettings { units, mode, count } = settings;

        let plan = SessionBuilder::new(&bank)
            .with_mode(mode)
            .with_count(count)
            .build(&units, &mut self.rng);
        self.bank = bank;

        if plan.is_empty() {
            info!(%mode, "no questions matched the selection");
            self.session = None;
            return Ok(StartOutcome::NoQuestionsMatched);
        }

        let matching = plan.matching;
        let session = QuizSession::new(token, mode, plan.questions, self.clock)?;
        let total = session.total();
        info!(%token, total, matching, %mode, "session started");
        self.session = Some(session);

        Ok(StartOutcome::Started { total, matching })
    }

    /// Discard the current session and return to the pre-start state.
    ///
    /// Loads still in flight are invalidated.
    pub fn reset_session(&mut self) {
        self.token = self.token.next();
        if self.session.take().is_some() {
            info!("session reset");
        }
    }

    //
    // ─── SESSION ACTIONS ───────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::NotStarted, QuizSession::phase)
    }

    #[must_use]
    pub fn current(&self) -> Option<QuestionView<'_>> {
        self.session.as_ref()?.view()
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(QuizSession::progress)
    }

    fn session_mut(&mut self) -> Result<&mut QuizSession, SessionError> {
        self.session.as_mut().ok_or(SessionError::NotStarted)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Session` without a running session or for an invalid choice.
    pub fn choose(&mut self, index: usize) -> Result<(), QuizError> {
        Ok(self.session_mut()?.choose(index)?)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Session` without a running session or for an invalid step.
    pub fn pick_step(&mut self, index: usize) -> Result<(), QuizError> {
        Ok(self.session_mut()?.pick_step(index)?)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Session` without a running session.
    pub fn undo_step(&mut self) -> Result<Option<usize>, QuizError> {
        Ok(self.session_mut()?.undo_step()?)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Session` without a running session.
    pub fn clear_steps(&mut self) -> Result<(), QuizError> {
        Ok(self.session_mut()?.clear_steps()?)
    }

    /// Grade the current question from its transient selection.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if no session is running, the session is
    /// complete, or nothing was chosen.
    pub fn submit_selection(&mut self) -> Result<Feedback, QuizError> {
        Ok(self.session_mut()?.submit_selection()?.clone())
    }

    /// Grade `answer` against the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if no session is running, the session is
    /// complete, or the answer does not fit the question.
    pub fn submit_answer(&mut self, answer: &Answer) -> Result<Feedback, QuizError> {
        Ok(self.session_mut()?.submit(answer)?.clone())
    }

    /// Move to the next question, or complete the session after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if no session is running.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        let session = self.session_mut()?;
        let advance = session.advance();
        if advance == Advance::Completed {
            info!(total = session.total(), "session complete");
        }
        Ok(advance)
    }

    /// Score of the running (or just completed) session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if no session is running.
    pub fn summary(&self) -> Result<SessionSummary, QuizError> {
        let session = self.session.as_ref().ok_or(SessionError::NotStarted)?;
        Ok(session.summary()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COUNT;
    use storage::InMemorySource;

    fn config() -> QuizConfig {
        QuizConfig::new(
            "data",
            vec![
                UnitEntry::new(
                    UnitName::new("Heart").unwrap(),
                    SourceId::new("heart.jsonl").unwrap(),
                ),
                UnitEntry::new(
                    UnitName::new("Nervous").unwrap(),
                    SourceId::new("nervous.jsonl").unwrap(),
                ),
            ],
            None,
        )
        .unwrap()
    }

    fn controller() -> QuizController {
        QuizController::new(config(), Arc::new(InMemorySource::new())).with_seed(1)
    }

    #[test]
    fn select_units_validates_against_catalog() {
        let mut quiz = controller();

        assert!(matches!(
            quiz.select_units(Vec::<String>::new()),
            Err(QuizError::NoUnitsSelected)
        ));
        assert!(matches!(
            quiz.select_units(["Heart", "Lungs"]),
            Err(QuizError::UnknownUnit(name)) if name == "Lungs"
        ));
        assert!(quiz.selected_units().is_empty());

        quiz.select_units(["Nervous", "Heart", "Nervous"]).unwrap();
        let names: Vec<_> = quiz.selected_units().iter().map(UnitName::as_str).collect();
        assert_eq!(names, vec!["Nervous", "Heart"]);
    }

    #[test]
    fn set_count_falls_back_to_default() {
        let mut quiz = controller();
        assert_eq!(quiz.count(), DEFAULT_COUNT);
        assert_eq!(quiz.set_count(Some(10)), 10);
        assert_eq!(quiz.set_count(Some(0)), DEFAULT_COUNT);
        assert_eq!(quiz.set_count(Some(-4)), DEFAULT_COUNT);
        assert_eq!(quiz.set_count(Some(7)), 7);
        assert_eq!(quiz.set_count(None), DEFAULT_COUNT);
    }

    #[test]
    fn begin_start_requires_selection() {
        let mut quiz = controller();
        assert!(matches!(quiz.begin_start(), Err(QuizError::NoUnitsSelected)));
    }

    #[test]
    fn actions_without_session_report_not_started() {
        let mut quiz = controller();
        assert_eq!(quiz.phase(), SessionPhase::NotStarted);
        assert!(quiz.current().is_none());
        assert!(matches!(
            quiz.advance(),
            Err(QuizError::Session(SessionError::NotStarted))
        ));
        assert!(matches!(
            quiz.submit_answer(&Answer::Reveal),
            Err(QuizError::Session(SessionError::NotStarted))
        ));
        assert!(quiz.summary().is_err());
    }
}
