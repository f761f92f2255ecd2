//! NewsAPI top-headlines feed.

use std::time::Duration;

use async_trait::async_trait;
use newsgpt_interface::{Article, FeedError, NewsFeed};
use serde::Deserialize;

pub const NEWS_API_URL: &str = "https://newsapi.org/v2/top-headlines";

#[derive(Deserialize)]
struct HeadlinesResponse {
  #[serde(default)]
  articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
struct RawArticle {
  title: Option<String>,
  description: Option<String>,
}

impl From<RawArticle> for Article {
  fn from(raw: RawArticle) -> Self {
    Article {
      title: raw.title.unwrap_or_default(),
      description: raw.description.unwrap_or_default(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct NewsApiFeed {
  client: reqwest::Client,
  url: String,
  api_key: String,
}

impl NewsApiFeed {
  pub fn new(
    url: impl Into<String>,
    api_key: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, reqwest::Error> {
    // NewsAPI rejects requests that carry no user agent.
    let client = reqwest::Client::builder()
      .user_agent(concat!("newsgpt/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()?;
    Ok(NewsApiFeed {
      client,
      url: url.into(),
      api_key: api_key.into(),
    })
  }
}

#[async_trait]
impl NewsFeed for NewsApiFeed {
  async fn headlines(&self, language: &str) -> Result<Vec<Article>, FeedError> {
    let response = self
      .client
      .get(&self.url)
      .query(&[("language", language), ("apiKey", self.api_key.as_str())])
      .send()
      .await
      .map_err(|e| FeedError::Transport {
        source: Box::new(e),
      })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| FeedError::Transport {
      source: Box::new(e),
    })?;

    if !status.is_success() {
      return Err(FeedError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let parsed: HeadlinesResponse =
      serde_json::from_str(&body).map_err(|e| FeedError::Malformed {
        source: Box::new(e),
      })?;
    log::debug!("Feed returned {} articles", parsed.articles.len());

    Ok(parsed.articles.into_iter().map(Article::from).collect())
  }
}
