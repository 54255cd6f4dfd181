use quiz_core::Feedback;
use quiz_core::model::{Question, Selection};

/// What a presentation layer needs to render the question on screen.
#[derive(Debug, Clone, Copy)]
pub struct QuestionView<'a> {
    /// 1-based position in the session.
    pub position: usize,
    pub total: usize,
    pub question: &'a Question,
    pub selection: Option<&'a Selection>,
    pub feedback: Option<&'a Feedback>,
}

impl QuestionView<'_> {
    /// Header line, e.g. `Heart • mcq`.
    #[must_use]
    pub fn meta(&self) -> String {
        self.question.meta()
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        self.question.stem()
    }

    /// True once feedback is shown and the advance action is enabled.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.feedback.is_some()
    }

    /// Steps the user has picked so far, in order, for chain questions.
    #[must_use]
    pub fn picked_steps(&self) -> Vec<&str> {
        let steps = self.question.steps();
        self.selection
            .map(Selection::picked)
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| steps.get(i).map(String::as_str))
            .collect()
    }
}
