#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use config::{DEFAULT_COUNT, QuizConfig, UnitEntry};
pub use controller::{LoadedStart, PendingStart, QuizController, StartOutcome};
pub use error::{ConfigError, LoadError, QuizError, SessionError};
pub use loader::BankLoader;

pub use sessions::{
    Advance, QuestionView, QuizSession, SessionBuilder, SessionPhase, SessionPlan,
    SessionProgress,
};
