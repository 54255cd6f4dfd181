#![forbid(unsafe_code)]

pub mod grading;
pub mod model;
pub mod shuffle;
pub mod time;

pub use grading::{Feedback, GradingError, Reveal, Verdict, grade};
pub use time::Clock;
