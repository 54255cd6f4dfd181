use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{Answer, Question, QuizMode, Selection, SessionSummary, SessionToken};
use quiz_core::{Clock, Feedback, Verdict, grade};

use super::progress::{Advance, SessionPhase, SessionProgress};
use super::view::QuestionView;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz run over a fixed, shuffled pool.
///
/// The cursor only moves forward. Each question is graded before the
/// session lets it advance; the transient selection and feedback belong to
/// the question on screen and are reset on every advance.
pub struct QuizSession {
    token: SessionToken,
    mode: QuizMode,
    pool: Vec<Question>,
    idx: usize,
    selection: Option<Selection>,
    feedback: Option<Feedback>,
    verdicts: Vec<Verdict>,
    clock: Clock,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over `pool`, positioned on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `pool` is empty.
    pub fn new(
        token: SessionToken,
        mode: QuizMode,
        pool: Vec<Question>,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let Some(first) = pool.first() else {
            return Err(SessionError::Empty);
        };
        let selection = Some(Selection::for_question(first));

        Ok(Self {
            token,
            mode,
            pool,
            idx: 0,
            selection,
            feedback: None,
            verdicts: Vec::new(),
            clock,
            started_at: clock.now(),
            completed_at: None,
        })
    }

    #[must_use]
    pub fn token(&self) -> SessionToken {
        self.token
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
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
    pub fn questions(&self) -> &[Question] {
        &self.pool
    }

    /// Total number of questions in this session.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pool.len()
    }

    /// Cursor into the pool; equals `total()` once complete.
    #[must_use]
    pub fn index(&self) -> usize {
        self.idx
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// True once the current question has been graded.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.feedback.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_complete() {
            SessionPhase::Complete
        } else {
            SessionPhase::InProgress {
                index: self.idx,
                answered: self.is_answered(),
            }
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.pool.get(self.idx)
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Feedback for the current question, once it has been submitted.
    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Verdicts recorded so far, one per answered question.
    #[must_use]
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    /// Number of questions that have been answered.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.verdicts.len()
    }

    /// Number of questions not answered yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pool.len().saturating_sub(self.verdicts.len())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total(),
            answered: self.answered_count(),
            remaining: self.remaining(),
            is_complete: self.is_complete(),
        }
    }

    /// Presentation snapshot of the current question.
    #[must_use]
    pub fn view(&self) -> Option<QuestionView<'_>> {
        let question = self.current()?;
        Some(QuestionView {
            position: self.idx + 1,
            total: self.total(),
            question,
            selection: self.selection.as_ref(),
            feedback: self.feedback.as_ref(),
        })
    }

    fn selection_mut(&mut self) -> Result<&mut Selection, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        self.selection.as_mut().ok_or(SessionError::Completed)
    }

    /// Choose an option of the current mcq question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` for invalid picks and
    /// `SessionError::Completed` once the session is over.
    pub fn choose(&mut self, index: usize) -> Result<(), SessionError> {
        Ok(self.selection_mut()?.choose(index)?)
    }

    /// Append a step to the picked order of the current chain question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` for invalid picks and
    /// `SessionError::Completed` once the session is over.
    pub fn pick_step(&mut self, index: usize) -> Result<(), SessionError> {
        Ok(self.selection_mut()?.pick_step(index)?)
    }

    /// Drop the last picked step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is over.
    pub fn undo_step(&mut self) -> Result<Option<usize>, SessionError> {
        Ok(self.selection_mut()?.undo_step())
    }

    /// Drop all picked steps.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is over.
    pub fn clear_steps(&mut self) -> Result<(), SessionError> {
        self.selection_mut()?.clear_steps();
        Ok(())
    }

    /// Grade the current transient selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Selection` if nothing was chosen for an mcq,
    /// and `SessionError::Completed` once the session is over.
    pub fn submit_selection(&mut self) -> Result<&Feedback, SessionError> {
        let answer = self.selection_mut()?.to_answer()?;
        self.submit(&answer)
    }

    /// Grade `answer` against the current question.
    ///
    /// Submitting again before advancing re-grades and replaces the previous
    /// feedback; the question is still counted once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Grading` if the answer does not fit the question
    /// type, and `SessionError::Completed` once the session is over.
    pub fn submit(&mut self, answer: &Answer) -> Result<&Feedback, SessionError> {
        let question = self.current().ok_or(SessionError::Completed)?;
        let feedback = grade(question, answer)?;

        if self.feedback.is_some() {
            if let Some(last) = self.verdicts.last_mut() {
                *last = feedback.verdict;
            }
        } else {
            self.verdicts.push(feedback.verdict);
        }

        Ok(&*self.feedback.insert(feedback))
    }

    /// Move past the current question.
    ///
    /// Does nothing until the current question has been answered, and
    /// nothing once the session is complete.
    pub fn advance(&mut self) -> Advance {
        if self.is_complete() {
            return Advance::AlreadyComplete;
        }
        if !self.is_answered() {
            return Advance::NotAnswered;
        }

        self.idx += 1;
        self.feedback = None;
        match self.pool.get(self.idx) {
            Some(next) => {
                self.selection = Some(Selection::for_question(next));
                Advance::Next(self.idx)
            }
            None => {
                self.selection = None;
                self.completed_at = Some(self.clock.now());
                Advance::Completed
            }
        }
    }

    /// Tally of the verdicts recorded so far.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the clock moved backwards.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        Ok(SessionSummary::from_verdicts(
            self.started_at,
            self.completed_at,
            self.total(),
            &self.verdicts,
        )?)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("token", &self.token)
            .field("mode", &self.mode)
            .field("pool_len", &self.pool.len())
            .field("idx", &self.idx)
            .field("answered", &self.is_answered())
            .field("verdicts_len", &self.verdicts.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{SelectionError, UnitName};
    use quiz_core::time::fixed_clock;
    use quiz_core::{GradingError, Reveal};

    fn unit() -> UnitName {
        UnitName::new("Heart").unwrap()
    }

    fn mcq(answer: usize) -> Question {
        Question::mcq(unit(), "Q", vec!["a".into(), "b".into(), "c".into()], answer).unwrap()
    }

    fn chain() -> Question {
        Question::chain(
            unit(),
            "Order",
            vec!["x".into(), "y".into(), "z".into()],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    fn open() -> Question {
        Question::open(unit(), "Explain", vec!["point".into()]).unwrap()
    }

    fn session(pool: Vec<Question>) -> QuizSession {
        QuizSession::new(SessionToken::new(1), QuizMode::Mixed, pool, fixed_clock()).unwrap()
    }

    #[test]
    fn empty_pool_returns_error() {
        let err =
            QuizSession::new(SessionToken::new(1), QuizMode::Mcq, Vec::new(), fixed_clock())
                .unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn starts_in_progress_at_zero() {
        let session = session(vec![mcq(0), open()]);
        assert_eq!(
            session.phase(),
            SessionPhase::InProgress {
                index: 0,
                answered: false
            }
        );
        assert_eq!(session.progress().remaining, 2);
    }

    #[test]
    fn advance_before_answering_is_a_noop() {
        let mut session = session(vec![mcq(0), open()]);
        assert_eq!(session.advance(), Advance::NotAnswered);
        assert_eq!(session.index(), 0);
        assert!(session.verdicts().is_empty());
    }

    #[test]
    fn resubmitting_regrades_without_double_counting() {
        let mut session = session(vec![mcq(1)]);

        let first = session.submit(&Answer::Choice(1)).unwrap().verdict;
        let second = session.submit(&Answer::Choice(1)).unwrap().verdict;
        assert_eq!(first, Verdict::Correct);
        assert_eq!(first, second);
        assert_eq!(session.verdicts(), &[Verdict::Correct]);

        session.submit(&Answer::Choice(0)).unwrap();
        assert_eq!(session.verdicts(), &[Verdict::Incorrect]);
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn submit_selection_requires_a_choice() {
        let mut session = session(vec![mcq(2)]);
        let err = session.submit_selection().unwrap_err();
        assert_eq!(err, SessionError::Selection(SelectionError::NothingChosen));

        session.choose(2).unwrap();
        let feedback = session.submit_selection().unwrap();
        assert_eq!(feedback.verdict, Verdict::Correct);
        assert_eq!(feedback.reveal, Reveal::Choice(2));
    }

    #[test]
    fn chain_selection_is_graded_positionally() {
        let mut session = session(vec![chain()]);
        session.pick_step(1).unwrap();
        session.pick_step(0).unwrap();
        session.pick_step(2).unwrap();
        assert_eq!(
            session.submit_selection().unwrap().verdict,
            Verdict::Incorrect
        );

        session.clear_steps().unwrap();
        for step in [0, 1, 2] {
            session.pick_step(step).unwrap();
        }
        assert_eq!(session.submit_selection().unwrap().verdict, Verdict::Correct);
        assert_eq!(session.verdicts(), &[Verdict::Correct]);
    }

    #[test]
    fn advancing_resets_transient_state() {
        let mut session = session(vec![chain(), mcq(0)]);
        session.pick_step(0).unwrap();
        session.submit_selection().unwrap();

        assert_eq!(session.advance(), Advance::Next(1));
        assert!(session.feedback().is_none());
        assert_eq!(session.selection().and_then(Selection::chosen), None);
        assert!(session.selection().unwrap().picked().is_empty());
    }

    #[test]
    fn wrong_answer_kind_is_rejected() {
        let mut session = session(vec![open()]);
        let err = session.submit(&Answer::Choice(0)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Grading(GradingError::AnswerMismatch { .. })
        ));
        assert!(!session.is_answered());
    }

    #[test]
    fn completes_after_last_question_and_stays_complete() {
        let mut session = session(vec![open(), mcq(0)]);

        session.submit(&Answer::Reveal).unwrap();
        assert_eq!(session.advance(), Advance::Next(1));
        session.submit(&Answer::Choice(1)).unwrap();
        assert_eq!(session.advance(), Advance::Completed);

        assert!(session.is_complete());
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert_eq!(session.index(), session.total());
        assert!(session.current().is_none());
        assert_eq!(session.advance(), Advance::AlreadyComplete);
        assert_eq!(session.advance(), Advance::AlreadyComplete);
        assert_eq!(
            session.submit(&Answer::Reveal).unwrap_err(),
            SessionError::Completed
        );

        let summary = session.summary().unwrap();
        assert_eq!(summary.total_questions(), 2);
        assert_eq!(summary.submitted(), 1);
        assert_eq!(summary.incorrect(), 1);
        assert!(summary.completed_at().is_some());
    }
}
