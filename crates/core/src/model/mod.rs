mod answer;
mod bank;
mod ids;
mod mode;
mod question;
mod session;

pub use answer::{Answer, Selection, SelectionError};
pub use bank::QuestionBank;
pub use ids::{IdError, SessionToken, SourceId, UnitName};
pub use mode::{QuizMode, QuizModeError};
pub use question::{Question, QuestionBody, QuestionError, QuestionType};
pub use session::{SessionSummary, SessionSummaryError};
