//! Scripted stand-ins for the completion service and the news feed.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use async_trait::async_trait;
use newsgpt_interface::{
  Article, CompletionFailure, CompletionRequest, CompletionService, FeedError, NewsFeed,
};

use crate::delivery::{LessonDelivery, RenderMode};

/// Replies are popped in order; once the script runs out every call
/// answers with "mock response".
#[derive(Clone, Default)]
pub struct ScriptedCompletions {
  replies: Arc<Mutex<VecDeque<Result<String, CompletionFailure>>>>,
  requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedCompletions {
  pub fn new(replies: Vec<Result<String, CompletionFailure>>) -> Self {
    Self {
      replies: Arc::new(Mutex::new(VecDeque::from(replies))),
      requests: Arc::default(),
    }
  }

  pub fn requests(&self) -> Vec<CompletionRequest> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl CompletionService for ScriptedCompletions {
  async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure> {
    self.requests.lock().unwrap().push(request.clone());
    self
      .replies
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Ok("mock response".to_string()))
  }
}

#[derive(Clone)]
pub struct StaticFeed {
  articles: Option<Vec<Article>>,
  languages: Arc<Mutex<Vec<String>>>,
}

impl StaticFeed {
  pub fn with_articles(articles: Vec<Article>) -> Self {
    Self {
      articles: Some(articles),
      languages: Arc::default(),
    }
  }

  pub fn failing() -> Self {
    Self {
      articles: None,
      languages: Arc::default(),
    }
  }

  pub fn requested_languages(&self) -> Vec<String> {
    self.languages.lock().unwrap().clone()
  }

  pub fn calls(&self) -> usize {
    self.languages.lock().unwrap().len()
  }
}

#[async_trait]
impl NewsFeed for StaticFeed {
  async fn headlines(&self, language: &str) -> Result<Vec<Article>, FeedError> {
    self.languages.lock().unwrap().push(language.to_string());
    match &self.articles {
      Some(articles) => Ok(articles.clone()),
      None => Err(FeedError::Status {
        status: 401,
        body: "apiKeyInvalid".to_string(),
      }),
    }
  }
}

pub fn article(title: &str, description: &str) -> Article {
  Article {
    title: title.to_string(),
    description: description.to_string(),
  }
}

pub fn concealed(delivery: &LessonDelivery) -> Vec<&str> {
  delivery
    .items
    .iter()
    .filter(|item| item.mode == RenderMode::Concealed)
    .map(|item| item.content.as_str())
    .collect()
}
