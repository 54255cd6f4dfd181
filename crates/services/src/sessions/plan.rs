use rand::Rng;

use quiz_core::model::{Question, QuestionBank, QuizMode, UnitName};
use quiz_core::shuffle::shuffle;

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    /// Questions that matched the units and mode before truncation.
    pub matching: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// True when nothing matched; callers report this as "no questions found".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Builds a session pool from a bank: flatten, filter by mode, shuffle, truncate.
pub struct SessionBuilder<'a> {
    bank: &'a QuestionBank,
    mode: QuizMode,
    count: usize,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self {
            bank,
            mode: QuizMode::Mixed,
            count: usize::MAX,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: QuizMode) -> Self {
        self.mode = mode;
        self
    }

    /// Upper bound on the session length.
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Assemble the pool for `units`, taken in the order given.
    ///
    /// Units missing from the bank contribute nothing. The result has
    /// `min(count, matching)` questions in uniformly random order.
    pub fn build<R: Rng + ?Sized>(self, units: &[UnitName], rng: &mut R) -> SessionPlan {
        let mut pool: Vec<Question> = units
            .iter()
            .flat_map(|unit| self.bank.questions(unit))
            .filter(|q| self.mode.admits(q))
            .cloned()
            .collect();
        let matching = pool.len();

        shuffle(&mut pool, rng);
        pool.truncate(self.count);

        SessionPlan {
            questions: pool,
            matching,
        }
    }
}
