use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::grading::Verdict;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,
}

/// Tally of a finished (or abandoned) quiz run.
///
/// Summaries live only as long as the session; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    total_questions: usize,
    correct: usize,
    incorrect: usize,
    submitted: usize,
}

impl SessionSummary {
    /// Build a summary from the verdicts recorded so far.
    ///
    /// `total_questions` is the size of the session pool; it may exceed the
    /// number of verdicts while the session is still running.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_verdicts(
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        total_questions: usize,
        verdicts: &[Verdict],
    ) -> Result<Self, SessionSummaryError> {
        if completed_at.is_some_and(|done| done < started_at) {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let mut correct = 0_usize;
        let mut incorrect = 0_usize;
        let mut submitted = 0_usize;
        for verdict in verdicts {
            match verdict {
                Verdict::Correct => correct += 1,
                Verdict::Incorrect => incorrect += 1,
                Verdict::Submitted => submitted += 1,
            }
        }

        Ok(Self {
            started_at,
            completed_at,
            total_questions,
            correct,
            incorrect,
            submitted,
        })
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.correct + self.incorrect + self.submitted
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> usize {
        self.incorrect
    }

    /// Open questions acknowledged without a score.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Number of questions that were scored (mcq and chain).
    #[must_use]
    pub fn graded(&self) -> usize {
        self.correct + self.incorrect
    }
}
