use std::{fmt, str::FromStr};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionFailure {
  #[error("{status} - {body}")]
  Status { status: u16, body: String },

  #[error("request failed: {source}")]
  Transport {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("malformed completion response: {0}")]
  Malformed(String),
}

#[derive(Error, Debug)]
pub enum FeedError {
  #[error("news feed returned {status} - {body}")]
  Status { status: u16, body: String },

  #[error("news feed request failed")]
  Transport {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("news feed payload could not be decoded")]
  Malformed {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown level {0:?}")]
pub struct UnknownLevel(pub String);

/// Self-reported proficiency of the learner.
///
/// `Intermediate` is the default, used when a lesson is requested for a
/// session that never picked a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Level {
  Beginner,
  #[default]
  Intermediate,
  Advanced,
}

impl Level {
  pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Beginner => "beginner",
      Level::Intermediate => "intermediate",
      Level::Advanced => "advanced",
    }
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Level {
  type Err = UnknownLevel;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_lowercase();
    Level::ALL
      .into_iter()
      .find(|level| level.as_str() == wanted)
      .ok_or_else(|| UnknownLevel(s.to_string()))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
  pub title: String,
  pub description: String,
}

impl Article {
  pub fn is_blank(&self) -> bool {
    self.title.trim().is_empty() && self.description.trim().is_empty()
  }

  /// Text handed to the adaptation stage.
  pub fn content(&self) -> String {
    format!("{}\n\n{}", self.title, self.description)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
  pub system_prompt: String,
  pub user_prompt: String,
  pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
  /// Returns the text of the first completion choice.
  async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure>;
}

#[async_trait]
pub trait NewsFeed: Send + Sync {
  /// Top headlines in `language`. An empty list is a valid answer.
  async fn headlines(&self, language: &str) -> Result<Vec<Article>, FeedError>;
}
