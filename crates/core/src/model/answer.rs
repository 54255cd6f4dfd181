use thiserror::Error;

use crate::model::question::{Question, QuestionBody, QuestionType};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("pick one choice before submitting")]
    NothingChosen,

    #[error("choice {index} is out of range for {choices} choices")]
    ChoiceOutOfRange { index: usize, choices: usize },

    #[error("step {index} is out of range for {steps} steps")]
    StepOutOfRange { index: usize, steps: usize },

    #[error("step {0} has already been picked")]
    StepAlreadyPicked(usize),

    #[error("this action does not apply to a {0} question")]
    NotApplicable(QuestionType),
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A submission for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Index of the chosen option of a multiple-choice question.
    Choice(usize),
    /// Acknowledge an open question and reveal its key points.
    Reveal,
    /// Step indices of a chain question in the order the user picked them.
    Order(Vec<usize>),
}

impl Answer {
    /// Question type this answer is meant for.
    #[must_use]
    pub fn kind(&self) -> QuestionType {
        match self {
            Answer::Choice(_) => QuestionType::Mcq,
            Answer::Reveal => QuestionType::Open,
            Answer::Order(_) => QuestionType::Chain,
        }
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Transient input state for the question currently on screen.
///
/// Created when a question is shown and dropped when the next one is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Choice {
        chosen: Option<usize>,
        choices: usize,
    },
    Reveal,
    Order {
        picked: Vec<usize>,
        steps: usize,
    },
}

impl Selection {
    /// Empty selection matching the shape of `question`.
    #[must_use]
    pub fn for_question(question: &Question) -> Self {
        match question.body() {
            QuestionBody::Mcq { choices, .. } => Selection::Choice {
                chosen: None,
                choices: choices.len(),
            },
            QuestionBody::Open { .. } => Selection::Reveal,
            QuestionBody::Chain { steps, .. } => Selection::Order {
                picked: Vec::with_capacity(steps.len()),
                steps: steps.len(),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        match self {
            Selection::Choice { .. } => QuestionType::Mcq,
            Selection::Reveal => QuestionType::Open,
            Selection::Order { .. } => QuestionType::Chain,
        }
    }

    /// Choose an option, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::ChoiceOutOfRange` for an invalid index and
    /// `SelectionError::NotApplicable` for non-mcq questions.
    pub fn choose(&mut self, index: usize) -> Result<(), SelectionError> {
        let kind = self.kind();
        let Selection::Choice { chosen, choices } = self else {
            return Err(SelectionError::NotApplicable(kind));
        };
        if index >= *choices {
            return Err(SelectionError::ChoiceOutOfRange {
                index,
                choices: *choices,
            });
        }
        *chosen = Some(index);
        Ok(())
    }

    /// Append a step to the picked order.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::StepOutOfRange`, `SelectionError::StepAlreadyPicked`
    /// or `SelectionError::NotApplicable` for non-chain questions.
    pub fn pick_step(&mut self, index: usize) -> Result<(), SelectionError> {
        let kind = self.kind();
        let Selection::Order { picked, steps } = self else {
            return Err(SelectionError::NotApplicable(kind));
        };
        if index >= *steps {
            return Err(SelectionError::StepOutOfRange {
                index,
                steps: *steps,
            });
        }
        if picked.contains(&index) {
            return Err(SelectionError::StepAlreadyPicked(index));
        }
        picked.push(index);
        Ok(())
    }

    /// Remove the most recently picked step.
    pub fn undo_step(&mut self) -> Option<usize> {
        match self {
            Selection::Order { picked, .. } => picked.pop(),
            _ => None,
        }
    }

    pub fn clear_steps(&mut self) {
        if let Selection::Order { picked, .. } = self {
            picked.clear();
        }
    }

    #[must_use]
    pub fn chosen(&self) -> Option<usize> {
        match self {
            Selection::Choice { chosen, .. } => *chosen,
            _ => None,
        }
    }

    #[must_use]
    pub fn picked(&self) -> &[usize] {
        match self {
            Selection::Order { picked, .. } => picked,
            _ => &[],
        }
    }

    /// Turn the current selection into a submission.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::NothingChosen` for an mcq with no choice yet.
    pub fn to_answer(&self) -> Result<Answer, SelectionError> {
        match self {
            Selection::Choice { chosen, .. } => chosen
                .map(Answer::Choice)
                .ok_or(SelectionError::NothingChosen),
            Selection::Reveal => Ok(Answer::Reveal),
            Selection::Order { picked, .. } => Ok(Answer::Order(picked.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitName;

    fn unit() -> UnitName {
        UnitName::new("Heart").unwrap()
    }

    fn mcq() -> Question {
        Question::mcq(unit(), "Q", vec!["a".into(), "b".into(), "c".into()], 1).unwrap()
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

    #[test]
    fn mcq_requires_a_choice() {
        let mut selection = Selection::for_question(&mcq());
        assert_eq!(selection.to_answer(), Err(SelectionError::NothingChosen));

        selection.choose(0).unwrap();
        selection.choose(2).unwrap();
        assert_eq!(selection.to_answer(), Ok(Answer::Choice(2)));

        let err = selection.choose(3).unwrap_err();
        assert_eq!(
            err,
            SelectionError::ChoiceOutOfRange {
                index: 3,
                choices: 3
            }
        );
        assert_eq!(selection.chosen(), Some(2));
    }

    #[test]
    fn chain_picks_are_ordered_and_unique() {
        let mut selection = Selection::for_question(&chain());
        selection.pick_step(2).unwrap();
        selection.pick_step(0).unwrap();
        assert_eq!(
            selection.pick_step(2),
            Err(SelectionError::StepAlreadyPicked(2))
        );
        assert!(matches!(
            selection.pick_step(5),
            Err(SelectionError::StepOutOfRange { index: 5, steps: 3 })
        ));
        assert_eq!(selection.picked(), &[2, 0]);

        assert_eq!(selection.undo_step(), Some(0));
        selection.pick_step(1).unwrap();
        assert_eq!(selection.to_answer(), Ok(Answer::Order(vec![2, 1])));

        selection.clear_steps();
        assert!(selection.picked().is_empty());
    }

    #[test]
    fn actions_for_other_types_are_rejected() {
        let mut selection = Selection::for_question(&mcq());
        assert_eq!(
            selection.pick_step(0),
            Err(SelectionError::NotApplicable(QuestionType::Mcq))
        );

        let open = Question::open(unit(), "Explain", Vec::new()).unwrap();
        let mut selection = Selection::for_question(&open);
        assert!(selection.choose(0).is_err());
        assert_eq!(selection.to_answer(), Ok(Answer::Reveal));
    }
}
