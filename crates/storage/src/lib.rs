#![forbid(unsafe_code)]

pub mod file;
pub mod http;
pub mod memory;
pub mod record;
pub mod source;

pub use file::FileSource;
pub use http::HttpSource;
pub use memory::InMemorySource;
pub use record::{parse_chain_records, parse_unit_records};
pub use source::{QuestionSource, SourceError};
