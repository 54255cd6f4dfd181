//! Pure grading of a submission against the question's answer key.

use thiserror::Error;

use crate::model::{Answer, Question, QuestionBody, QuestionType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingError {
    #[error("a {got} answer cannot grade a {expected} question")]
    AnswerMismatch {
        expected: QuestionType,
        got: QuestionType,
    },
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Open questions are acknowledged, never scored.
    Submitted,
}

impl Verdict {
    /// Short feedback line for display.
    #[must_use]
    pub fn label(self, kind: QuestionType) -> &'static str {
        match (self, kind) {
            (Verdict::Correct, QuestionType::Chain) => "Correct order",
            (Verdict::Incorrect, QuestionType::Chain) => "Wrong order",
            (Verdict::Correct, _) => "Correct",
            (Verdict::Incorrect, _) => "Incorrect",
            (Verdict::Submitted, _) => "Submitted",
        }
    }
}

/// Reference material made available once a question has been answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    Choice(usize),
    KeyPoints(Vec<String>),
    Order(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub verdict: Verdict,
    pub reveal: Reveal,
}

/// Grade `answer` for `question`.
///
/// - mcq: correct iff the chosen index equals the key.
/// - open: always `Submitted`, revealing the key points.
/// - chain: correct iff the picked order equals the key element for element.
///
/// # Errors
///
/// Returns `GradingError::AnswerMismatch` if the answer is for another question type.
pub fn grade(question: &Question, answer: &Answer) -> Result<Feedback, GradingError> {
    match (question.body(), answer) {
        (QuestionBody::Mcq { answer: key, .. }, Answer::Choice(chosen)) => Ok(Feedback {
            verdict: verdict(chosen == key),
            reveal: Reveal::Choice(*key),
        }),
        (QuestionBody::Open { key_points }, Answer::Reveal) => Ok(Feedback {
            verdict: Verdict::Submitted,
            reveal: Reveal::KeyPoints(key_points.clone()),
        }),
        (QuestionBody::Chain { correct_order, .. }, Answer::Order(picked)) => Ok(Feedback {
            verdict: verdict(picked == correct_order),
            reveal: Reveal::Order(correct_order.clone()),
        }),
        _ => Err(GradingError::AnswerMismatch {
            expected: question.kind(),
            got: answer.kind(),
        }),
    }
}

fn verdict(correct: bool) -> Verdict {
    if correct {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}
