use std::fmt;

use newsgpt_interface::{
  Article, CompletionFailure, CompletionRequest, CompletionService, Level, NewsFeed,
};
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::answers::{split_answer_key, ExerciseSheet};

pub const NO_NEWS_PLACEHOLDER: &str = "Could not fetch any news.";

pub const FEED_LANGUAGE: &str = "en";

const ADAPT_MAX_TOKENS: u32 = 1000;
const EXPLAIN_MAX_TOKENS: u32 = 1000;
const EXERCISE_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Adapting,
  Explaining,
  Exercising,
}

impl Stage {
  fn failure_label(&self) -> &'static str {
    match self {
      Stage::Adapting => "Error adapting text",
      Stage::Explaining => "Error explaining grammar",
      Stage::Exercising => "Error creating exercises",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Adapting => "adapting",
      Stage::Explaining => "explaining",
      Stage::Exercising => "exercising",
    };
    f.write_str(name)
  }
}

/// A completion stage that did not produce content.
#[derive(Error, Debug)]
#[error("{}: {source}", .stage.failure_label())]
pub struct StageFailure {
  pub stage: Stage,
  #[source]
  pub source: CompletionFailure,
}

/// Picks one headline at random, skipping entries with neither title nor
/// description. Falls back to [`NO_NEWS_PLACEHOLDER`] when nothing usable
/// comes back from the feed.
pub async fn fetch_article<F: NewsFeed + ?Sized>(feed: &F) -> String {
  let articles = match feed.headlines(FEED_LANGUAGE).await {
    Ok(articles) => articles,
    Err(err) => {
      log::warn!("News feed unavailable: {err:?}");
      vec![]
    }
  };

  let usable = articles
    .into_iter()
    .filter(|article| !article.is_blank())
    .collect::<Vec<Article>>();
  log::debug!("Feed returned {} usable articles", usable.len());

  match usable.choose(&mut rand::thread_rng()) {
    Some(article) => article.content(),
    None => NO_NEWS_PLACEHOLDER.to_string(),
  }
}

pub async fn adapt<C: CompletionService + ?Sized>(
  completions: &C,
  level: Level,
  raw_text: &str,
) -> Result<String, StageFailure> {
  let request = CompletionRequest {
    system_prompt: "You are an English teacher.".to_string(),
    user_prompt: format!(
      "Please adapt the following text to a {level} level English learner:\n\n{raw_text}"
    ),
    max_tokens: ADAPT_MAX_TOKENS,
  };
  run_stage(completions, Stage::Adapting, &request).await
}

pub async fn explain<C: CompletionService + ?Sized>(
  completions: &C,
  native_language: &str,
  adapted_text: &str,
) -> Result<String, StageFailure> {
  let request = CompletionRequest {
    system_prompt: format!(
      "You are an English teacher who explains grammar and idioms in {native_language}."
    ),
    user_prompt: format!(
      "Explain the grammar and idioms in the following English text, giving the explanations in {native_language}:\n\n{adapted_text}"
    ),
    max_tokens: EXPLAIN_MAX_TOKENS,
  };
  run_stage(completions, Stage::Explaining, &request).await
}

pub async fn generate_exercises<C: CompletionService + ?Sized>(
  completions: &C,
  adapted_text: &str,
) -> Result<ExerciseSheet, StageFailure> {
  let request = CompletionRequest {
    system_prompt: "You are an English teacher creating exercises.".to_string(),
    user_prompt: format!(
      "Create exercises based on the following English text suitable for the student's level. \
       Number each exercise and provide multiple-choice options or fill-in-the-blank questions, as appropriate. \
       After listing all the exercises, provide the correct answers under the heading 'Answers:'. \
       Ensure that the answers correspond to the exercises by using the same numbering.\n\n{adapted_text}"
    ),
    max_tokens: EXERCISE_MAX_TOKENS,
  };
  let text = run_stage(completions, Stage::Exercising, &request).await?;
  Ok(split_answer_key(&text))
}

async fn run_stage<C: CompletionService + ?Sized>(
  completions: &C,
  stage: Stage,
  request: &CompletionRequest,
) -> Result<String, StageFailure> {
  log::debug!("Requesting completion for {stage}: {:?}", request.user_prompt);
  completions
    .complete(request)
    .await
    .map_err(|source| StageFailure { stage, source })
}
