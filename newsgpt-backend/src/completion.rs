//! OpenAI-style chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use newsgpt_interface::{CompletionFailure, CompletionRequest, CompletionService};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'static str,
  content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  model: Option<&'a str>,
  messages: Vec<ChatMessage<'a>>,
  max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
  client: reqwest::Client,
  url: String,
  api_key: Option<String>,
  model: Option<String>,
}

impl ChatCompletionClient {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(ChatCompletionClient {
      client,
      url: url.into(),
      api_key: None,
      model: None,
    })
  }

  /// Sends `Authorization: Bearer <key>` with every request.
  pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
    self.api_key = api_key;
    self
  }

  pub fn with_model(mut self, model: Option<String>) -> Self {
    self.model = model;
    self
  }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
  async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure> {
    let body = ChatRequest {
      model: self.model.as_deref(),
      messages: vec![
        ChatMessage {
          role: "system",
          content: &request.system_prompt,
        },
        ChatMessage {
          role: "user",
          content: &request.user_prompt,
        },
      ],
      max_tokens: request.max_tokens,
    };

    let mut builder = self.client.post(&self.url).json(&body);
    if let Some(api_key) = &self.api_key {
      builder = builder.bearer_auth(api_key);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| CompletionFailure::Transport {
        source: Box::new(e),
      })?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| CompletionFailure::Transport {
        source: Box::new(e),
      })?;
    log::debug!("Completion responded {status}");

    if !status.is_success() {
      return Err(CompletionFailure::Status {
        status: status.as_u16(),
        body: text,
      });
    }

    let parsed: ChatResponse =
      serde_json::from_str(&text).map_err(|e| CompletionFailure::Malformed(e.to_string()))?;

    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .ok_or_else(|| CompletionFailure::Malformed("no completion choices".to_string()))
  }
}
