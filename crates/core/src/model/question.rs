use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::UnitName;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question stem cannot be empty")]
    EmptyStem,

    #[error("multiple-choice question has no choices")]
    NoChoices,

    #[error("answer index {answer} is out of range for {choices} choices")]
    AnswerOutOfRange { answer: usize, choices: usize },

    #[error("chain question has no steps")]
    NoSteps,

    #[error("correct_order {order:?} is not a permutation of 0..{steps}")]
    InvalidOrder { order: Vec<usize>, steps: usize },
}

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// Discriminant of a question, as written in the `type` field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Open,
    Chain,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::Open => "open",
            QuestionType::Chain => "chain",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Type-specific payload of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionBody {
    /// Multiple choice; `answer` indexes into `choices`.
    Mcq { choices: Vec<String>, answer: usize },
    /// Open response; `key_points` are shown on reveal.
    Open { key_points: Vec<String> },
    /// Ordered steps; `correct_order` lists indices into `steps` in sequence.
    Chain {
        steps: Vec<String>,
        correct_order: Vec<usize>,
    },
}

/// A validated question belonging to exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    unit: UnitName,
    stem: String,
    body: QuestionBody,
}

impl Question {
    /// Validate and build a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stem is blank or the body breaks its
    /// type's invariants.
    pub fn new(
        unit: UnitName,
        stem: impl Into<String>,
        body: QuestionBody,
    ) -> Result<Self, QuestionError> {
        let stem = stem.into();
        if stem.trim().is_empty() {
            return Err(QuestionError::EmptyStem);
        }
        validate_body(&body)?;
        Ok(Self { unit, stem, body })
    }

    /// Build a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoChoices` or `QuestionError::AnswerOutOfRange`.
    pub fn mcq(
        unit: UnitName,
        stem: impl Into<String>,
        choices: Vec<String>,
        answer: usize,
    ) -> Result<Self, QuestionError> {
        Self::new(unit, stem, QuestionBody::Mcq { choices, answer })
    }

    /// Build an open-response question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyStem` if the stem is blank.
    pub fn open(
        unit: UnitName,
        stem: impl Into<String>,
        key_points: Vec<String>,
    ) -> Result<Self, QuestionError> {
        Self::new(unit, stem, QuestionBody::Open { key_points })
    }

    /// Build a chain (ordering) question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoSteps` or `QuestionError::InvalidOrder`.
    pub fn chain(
        unit: UnitName,
        stem: impl Into<String>,
        steps: Vec<String>,
        correct_order: Vec<usize>,
    ) -> Result<Self, QuestionError> {
        Self::new(
            unit,
            stem,
            QuestionBody::Chain {
                steps,
                correct_order,
            },
        )
    }

    #[must_use]
    pub fn unit(&self) -> &UnitName {
        &self.unit
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    #[must_use]
    pub fn kind(&self) -> QuestionType {
        match self.body {
            QuestionBody::Mcq { .. } => QuestionType::Mcq,
            QuestionBody::Open { .. } => QuestionType::Open,
            QuestionBody::Chain { .. } => QuestionType::Chain,
        }
    }

    /// Header line for display, e.g. `Heart • mcq`.
    #[must_use]
    pub fn meta(&self) -> String {
        format!("{} • {}", self.unit, self.kind())
    }

    /// Choices of a multiple-choice question, empty for other types.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        match &self.body {
            QuestionBody::Mcq { choices, .. } => choices,
            _ => &[],
        }
    }

    /// Steps of a chain question, empty for other types.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        match &self.body {
            QuestionBody::Chain { steps, .. } => steps,
            _ => &[],
        }
    }

    /// Re-home the question under another unit.
    #[must_use]
    pub fn with_unit(mut self, unit: UnitName) -> Self {
        self.unit = unit;
        self
    }
}

fn validate_body(body: &QuestionBody) -> Result<(), QuestionError> {
    match body {
        QuestionBody::Mcq { choices, answer } => {
            if choices.is_empty() {
                return Err(QuestionError::NoChoices);
            }
            if *answer >= choices.len() {
                return Err(QuestionError::AnswerOutOfRange {
                    answer: *answer,
                    choices: choices.len(),
                });
            }
        }
        QuestionBody::Open { .. } => {}
        QuestionBody::Chain {
            steps,
            correct_order,
        } => {
            if steps.is_empty() {
                return Err(QuestionError::NoSteps);
            }
            if !is_permutation(correct_order, steps.len()) {
                return Err(QuestionError::InvalidOrder {
                    order: correct_order.clone(),
                    steps: steps.len(),
                });
            }
        }
    }
    Ok(())
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
