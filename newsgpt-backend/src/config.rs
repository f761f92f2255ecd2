use std::time::Duration;

use newsgpt_lesson::{FailurePolicy, LessonOrchestrator, Tutor};
use thiserror::Error;

use crate::{completion::ChatCompletionClient, news::NewsApiFeed, news::NEWS_API_URL};

const DEFAULT_NATIVE_LANGUAGE: &str = "Russian";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("{name} not set, {hint}")]
  Missing { name: &'static str, hint: &'static str },

  #[error("{name} has invalid value {value:?}: {reason}")]
  Invalid {
    name: &'static str,
    value: String,
    reason: String,
  },

  #[error("Unable to build HTTP client")]
  Client {
    #[source]
    source: reqwest::Error,
  },
}

/// Endpoints, keys and lesson settings shared by every transport.
#[derive(Debug, Clone)]
pub struct Config {
  pub news_api_url: String,
  pub news_api_key: String,
  pub llm_api_url: String,
  pub llm_api_key: Option<String>,
  pub llm_model: Option<String>,
  pub native_language: String,
  pub failure_policy: FailurePolicy,
  pub timeout: Duration,
}

impl Config {
  pub fn from_env() -> Result<Config, ConfigError> {
    Config::from_lookup(|name| std::env::var(name).ok())
  }

  /// Reads settings through `lookup`; empty values count as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    let news_api_key = get("NEWS_API_KEY").ok_or(ConfigError::Missing {
      name: "NEWS_API_KEY",
      hint: "set it to a newsapi.org API key",
    })?;
    let llm_api_url = get("LLM_API_URL").ok_or(ConfigError::Missing {
      name: "LLM_API_URL",
      hint: "set it to a chat completions endpoint",
    })?;

    let failure_policy = match get("FAILURE_POLICY") {
      Some(value) => value
        .parse::<FailurePolicy>()
        .map_err(|e| ConfigError::Invalid {
          name: "FAILURE_POLICY",
          value: value.clone(),
          reason: e.to_string(),
        })?,
      None => FailurePolicy::default(),
    };

    let timeout = match get("HTTP_TIMEOUT_SECS") {
      Some(value) => {
        let secs = value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
          name: "HTTP_TIMEOUT_SECS",
          value: value.clone(),
          reason: e.to_string(),
        })?;
        Duration::from_secs(secs)
      }
      None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    };

    Ok(Config {
      news_api_url: get("NEWS_API_URL").unwrap_or_else(|| NEWS_API_URL.to_string()),
      news_api_key,
      llm_api_url,
      llm_api_key: get("LLM_API_KEY"),
      llm_model: get("LLM_MODEL"),
      native_language: get("NATIVE_LANGUAGE")
        .unwrap_or_else(|| DEFAULT_NATIVE_LANGUAGE.to_string()),
      failure_policy,
      timeout,
    })
  }

  pub fn build_tutor(&self) -> Result<Tutor<ChatCompletionClient, NewsApiFeed>, ConfigError> {
    let completions = ChatCompletionClient::new(&self.llm_api_url, self.timeout)
      .map_err(|source| ConfigError::Client { source })?
      .with_api_key(self.llm_api_key.clone())
      .with_model(self.llm_model.clone());
    let feed = NewsApiFeed::new(&self.news_api_url, &self.news_api_key, self.timeout)
      .map_err(|source| ConfigError::Client { source })?;

    let orchestrator = LessonOrchestrator::new(completions, feed)
      .with_native_language(&self.native_language)
      .with_policy(self.failure_policy);
    Ok(Tutor::new(orchestrator))
  }
}
