mod plan;
mod progress;
mod service;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::{Advance, SessionPhase, SessionProgress};
pub use service::QuizSession;
pub use view::QuestionView;
