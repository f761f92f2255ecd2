//! HTTP implementations of the news feed and completion service, plus the
//! environment configuration that wires them into a [`newsgpt_lesson::Tutor`].

pub mod completion;
pub mod config;
pub mod news;

pub use completion::ChatCompletionClient;
pub use config::{Config, ConfigError};
pub use news::NewsApiFeed;
