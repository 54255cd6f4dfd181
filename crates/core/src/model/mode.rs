use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::question::{Question, QuestionType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {raw} (expected mcq, open, chain or mixed)")]
pub struct QuizModeError {
    pub raw: String,
}

/// Filter restricting a session to one question type, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Mcq,
    Open,
    Chain,
    #[default]
    Mixed,
}

impl QuizMode {
    /// Returns true when a question of `kind` belongs in a session of this mode.
    #[must_use]
    pub fn admits_kind(self, kind: QuestionType) -> bool {
        match self {
            QuizMode::Mixed => true,
            QuizMode::Mcq => kind == QuestionType::Mcq,
            QuizMode::Open => kind == QuestionType::Open,
            QuizMode::Chain => kind == QuestionType::Chain,
        }
    }

    #[must_use]
    pub fn admits(self, question: &Question) -> bool {
        self.admits_kind(question.kind())
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Mcq => "mcq",
            QuizMode::Open => "open",
            QuizMode::Chain => "chain",
            QuizMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = QuizModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcq" => Ok(QuizMode::Mcq),
            "open" => Ok(QuizMode::Open),
            "chain" => Ok(QuizMode::Chain),
            "mixed" => Ok(QuizMode::Mixed),
            _ => Err(QuizModeError { raw: s.to_string() }),
        }
    }
}
